use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{BasketLine, Order, OrderContact, OrderItem, Product, User};

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync + 'static {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
pub trait BasketStore: Send + Sync + 'static {
    async fn lines_for_user(&self, user_id: i64) -> Result<Vec<BasketLine>, StoreError>;

    /// Inserts a line with quantity 1, or bumps the existing line for the
    /// same product by one.
    async fn add_product(&self, user_id: i64, product_id: i64) -> Result<BasketLine, StoreError>;

    /// Deletes a line outright. The line must belong to `user_id`.
    async fn remove_line(&self, user_id: i64, line_id: i64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Persists a new pending order. `items` must not be empty.
    async fn create_order(
        &self,
        initiator_id: i64,
        contact: OrderContact,
        items: Vec<OrderItem>,
    ) -> Result<Order, StoreError>;

    /// Transitions an order to paid. Idempotent: marking an already-paid
    /// order is a no-op, not an error.
    async fn mark_paid(&self, order_id: i64) -> Result<(), StoreError>;

    async fn get_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    /// The user's orders, newest first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError>;
}

/// The full set of repository handles the request layer works against.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub baskets: Arc<dyn BasketStore>,
    pub orders: Arc<dyn OrderStore>,
}
