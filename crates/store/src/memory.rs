use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use storefront_common::get_current_timestamp;

use crate::error::StoreError;
use crate::models::{BasketLine, Order, OrderContact, OrderItem, OrderStatus, Product, User};
use crate::stores::{BasketStore, OrderStore, ProductStore, Stores, UserStore};

#[derive(Debug, Clone)]
struct BasketRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    quantity: i32,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    users: HashMap<i64, User>,
    products: HashMap<i64, Product>,
    baskets: HashMap<i64, BasketRow>,
    orders: HashMap<i64, Order>,
}

impl MemoryInner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Hash-map backed twin of [`PgStore`](crate::PgStore) with the same
/// repository semantics. No persistence.
///
/// [`PgStore`]: crate::PgStore
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        let shared = Arc::new(self.clone());
        Stores {
            users: shared.clone(),
            products: shared.clone(),
            baskets: shared.clone(),
            orders: shared,
        }
    }

    pub async fn insert_user(&self, username: &str, email: &str, api_key: &str) -> User {
        let mut inner = self.inner.write().await;
        let user = User {
            id: inner.alloc_id(),
            username: username.to_string(),
            email: email.to_string(),
            api_key: api_key.to_string(),
            created_at: get_current_timestamp(),
        };
        inner.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_product(&self, name: &str, price: Decimal) -> Product {
        let mut inner = self.inner.write().await;
        let product = Product {
            id: inner.alloc_id(),
            name: name.to_string(),
            price,
            created_at: get_current_timestamp(),
        };
        inner.products.insert(product.id, product.clone());
        product
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.api_key == api_key)
            .cloned())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get_product(&self, product_id: i64) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.read().await.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl BasketStore for MemoryStore {
    async fn lines_for_user(&self, user_id: i64) -> Result<Vec<BasketLine>, StoreError> {
        let inner = self.inner.read().await;
        let mut lines: Vec<BasketLine> = inner
            .baskets
            .values()
            .filter(|row| row.user_id == user_id)
            .map(|row| {
                let product = inner
                    .products
                    .get(&row.product_id)
                    .expect("basket row references a product");
                BasketLine {
                    id: row.id,
                    product_id: row.product_id,
                    product_name: product.name.clone(),
                    unit_price: product.price,
                    quantity: row.quantity,
                }
            })
            .collect();
        lines.sort_by_key(|line| line.id);
        Ok(lines)
    }

    async fn add_product(&self, user_id: i64, product_id: i64) -> Result<BasketLine, StoreError> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get(&product_id)
            .cloned()
            .ok_or(StoreError::NotFound("product"))?;

        let existing = inner
            .baskets
            .values()
            .find(|row| row.user_id == user_id && row.product_id == product_id)
            .map(|row| row.id);

        let row = match existing {
            Some(id) => {
                let row = inner.baskets.get_mut(&id).expect("row id just looked up");
                row.quantity += 1;
                row.clone()
            }
            None => {
                let row = BasketRow {
                    id: inner.alloc_id(),
                    user_id,
                    product_id,
                    quantity: 1,
                };
                inner.baskets.insert(row.id, row.clone());
                row
            }
        };

        Ok(BasketLine {
            id: row.id,
            product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity: row.quantity,
        })
    }

    async fn remove_line(&self, user_id: i64, line_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .baskets
            .get(&line_id)
            .map(|row| row.user_id == user_id)
            .unwrap_or(false);

        if !owned {
            return Err(StoreError::NotFound("basket item"));
        }
        inner.baskets.remove(&line_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
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

        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&initiator_id) {
            return Err(StoreError::Validation(
                "initiator does not exist".to_string(),
            ));
        }

        let now = get_current_timestamp();
        let order = Order {
            id: inner.alloc_id(),
            initiator_id,
            contact,
            items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn mark_paid(&self, order_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound("order"))?;

        order.status = OrderStatus::Paid;
        order.updated_at = get_current_timestamp();
        Ok(())
    }

    async fn get_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|order| order.initiator_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contact() -> OrderContact {
        OrderContact {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Row".to_string(),
        }
    }

    fn item(product: &Product, quantity: i32) -> OrderItem {
        OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity,
        }
    }

    #[tokio::test]
    async fn create_order_rejects_empty_items() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;

        let err = store
            .create_order(user.id, contact(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.orders_for_user(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_order_rejects_unknown_initiator() {
        let store = MemoryStore::new();
        let product = store.insert_product("Keyboard", dec!(19.99)).await;

        let err = store
            .create_order(404, contact(), vec![item(&product, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn mark_paid_is_idempotent() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;
        let product = store.insert_product("Keyboard", dec!(19.99)).await;
        let order = store
            .create_order(user.id, contact(), vec![item(&product, 2)])
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        store.mark_paid(order.id).await.unwrap();
        store.mark_paid(order.id).await.unwrap();

        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn mark_paid_unknown_order_is_not_found() {
        let store = MemoryStore::new();
        let err = store.mark_paid(42).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn order_snapshot_survives_price_changes() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;
        let product = store.insert_product("Keyboard", dec!(19.99)).await;
        let order = store
            .create_order(user.id, contact(), vec![item(&product, 1)])
            .await
            .unwrap();

        // catalog edit after the fact
        store.inner.write().await.products.get_mut(&product.id).unwrap().price = dec!(99.99);

        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items[0].unit_price, dec!(19.99));
    }

    #[tokio::test]
    async fn add_product_increments_existing_line() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;
        let product = store.insert_product("Keyboard", dec!(19.99)).await;

        let first = store.add_product(user.id, product.id).await.unwrap();
        assert_eq!(first.quantity, 1);

        let second = store.add_product(user.id, product.id).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.quantity, 2);

        let lines = store.lines_for_user(user.id).await.unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn add_product_requires_existing_product() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;

        let err = store.add_product(user.id, 404).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remove_line_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let ada = store.insert_user("ada", "ada@example.com", "key_ada").await;
        let bob = store.insert_user("bob", "bob@example.com", "key_bob").await;
        let product = store.insert_product("Keyboard", dec!(19.99)).await;
        let line = store.add_product(ada.id, product.id).await.unwrap();

        let err = store.remove_line(bob.id, line.id).await.unwrap_err();
        assert!(err.is_not_found());

        store.remove_line(ada.id, line.id).await.unwrap();
        assert!(store.lines_for_user(ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_listed_newest_first() {
        let store = MemoryStore::new();
        let user = store.insert_user("ada", "ada@example.com", "key_ada").await;
        let product = store.insert_product("Keyboard", dec!(19.99)).await;

        let first = store
            .create_order(user.id, contact(), vec![item(&product, 1)])
            .await
            .unwrap();
        let second = store
            .create_order(user.id, contact(), vec![item(&product, 2)])
            .await
            .unwrap();

        let orders = store.orders_for_user(user.id).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
    }
}
