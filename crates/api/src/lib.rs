mod env;
mod global_state;
mod middleware;
mod response;
mod utils;
mod routes;

pub use routes::{
    basket_routes,
    misc_routes,
    order_routes,
    stripe_routes,
};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use utils::setup_tracing;
pub use middleware::{authenticate, ensure_account};
pub use response::{AppError, AppSuccess};
