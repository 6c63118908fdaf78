use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use storefront_common::get_current_timestamp;

use crate::error::StoreError;
use crate::models::{BasketLine, Order, OrderContact, OrderItem, OrderStatus, Product, User};
use crate::stores::{BasketStore, OrderStore, ProductStore, Stores, UserStore};

const SCHEMA_SQL: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        api_key TEXT NOT NULL UNIQUE,
        created_at BIGINT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS products (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
        created_at BIGINT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS basket_items (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        product_id BIGINT NOT NULL REFERENCES products (id) ON DELETE CASCADE,
        quantity INT NOT NULL CHECK (quantity > 0),
        created_at BIGINT NOT NULL,
        UNIQUE (user_id, product_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS orders (
        id BIGSERIAL PRIMARY KEY,
        initiator_id BIGINT NOT NULL REFERENCES users (id),
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL,
        address TEXT NOT NULL,
        items JSONB NOT NULL,
        status TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_basket_items_user ON basket_items (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_initiator ON orders (initiator_id)",
];

pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPool::connect(database_url).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA_SQL {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("[init_schema] schema is ready");
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn stores(self) -> Stores {
        let shared = Arc::new(self);
        Stores {
            users: shared.clone(),
            products: shared.clone(),
            baskets: shared.clone(),
            orders: shared,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    initiator_id: i64,
    first_name: String,
    last_name: String,
    email: String,
    address: String,
    items: Json<Vec<OrderItem>>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = sqlx::Error;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;

        Ok(Order {
            id: row.id,
            initiator_id: row.initiator_id,
            contact: OrderContact {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                address: row.address,
            },
            items: row.items.0,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, api_key, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, api_key, created_at FROM users WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, created_at FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }
}

#[async_trait]
impl BasketStore for PgStore {
    async fn lines_for_user(&self, user_id: i64) -> Result<Vec<BasketLine>, StoreError> {
        let lines = sqlx::query_as::<_, BasketLine>(
            r#"SELECT b.id, b.product_id, p.name AS product_name, p.price AS unit_price, b.quantity
               FROM basket_items b
               JOIN products p ON p.id = b.product_id
               WHERE b.user_id = $1
               ORDER BY b.id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn add_product(&self, user_id: i64, product_id: i64) -> Result<BasketLine, StoreError> {
        let product = self
            .get_product(product_id)
            .await?
            .ok_or(StoreError::NotFound("product"))?;

        let (line_id, quantity): (i64, i32) = sqlx::query_as(
            r#"INSERT INTO basket_items (user_id, product_id, quantity, created_at)
               VALUES ($1, $2, 1, $3)
               ON CONFLICT (user_id, product_id)
               DO UPDATE SET quantity = basket_items.quantity + 1
               RETURNING id, quantity"#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(get_current_timestamp())
        .fetch_one(&self.pool)
        .await?;

        Ok(BasketLine {
            id: line_id,
            product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity,
        })
    }

    async fn remove_line(&self, user_id: i64, line_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM basket_items WHERE id = $1 AND user_id = $2")
            .bind(line_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("basket item"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create_order(
        &self,
        initiator_id: i64,
        contact: OrderContact,
        items: Vec<OrderItem>,
    ) -> Result<Order, StoreError> {
        if items.is_empty() {
            return Err(StoreError::Validation(
                "order needs at least one line item".to_string(),
            ));
        }

        let now = get_current_timestamp();
        let row: OrderRow = sqlx::query_as(
            r#"INSERT INTO orders
                   (initiator_id, first_name, last_name, email, address, items, status, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
               RETURNING *"#,
        )
        .bind(initiator_id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.email)
        .bind(&contact.address)
        .bind(Json(&items))
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::Validation("initiator does not exist".to_string())
            } else {
                StoreError::from(e)
            }
        })?;

        Ok(Order::try_from(row)?)
    }

    async fn mark_paid(&self, order_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order_id)
            .bind(OrderStatus::Paid.as_str())
            .bind(get_current_timestamp())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("order"));
        }
        Ok(())
    }

    async fn get_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Order::try_from).transpose()?)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT * FROM orders WHERE initiator_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Order::try_from(row).map_err(StoreError::from))
            .collect()
    }
}
