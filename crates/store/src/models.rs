use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub api_key: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Major units, e.g. 19.99 USD. Converted to minor units only at the
    /// payment boundary, see [`to_minor_units`].
    pub price: Decimal,
    pub created_at: i64,
}

/// One basket row joined with the product it references.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BasketLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// A basket line frozen onto an order. Later catalog edits never touch
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub initiator_id: i64,
    #[serde(flatten)]
    pub contact: OrderContact,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Smallest-currency-unit amount for one unit of a product (1999 for
/// 19.99). `None` only when the value cannot fit an i64.
pub fn to_minor_units(price: Decimal) -> Option<i64> {
    (price * Decimal::from(100)).round().to_i64()
}
