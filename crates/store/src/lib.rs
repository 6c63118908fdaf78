mod error;
mod memory;
mod models;
mod postgres;
mod stores;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{
    to_minor_units, BasketLine, Order, OrderContact, OrderItem, OrderStatus, Product, User,
};
pub use postgres::{connect, init_schema, PgStore};
pub use stores::{BasketStore, OrderStore, ProductStore, Stores, UserStore};
