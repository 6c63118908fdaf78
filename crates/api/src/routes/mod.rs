mod basket;
mod misc;
mod orders;
mod stripe;

pub use basket::basket_routes;
pub use misc::misc_routes;
pub use orders::order_routes;
pub use stripe::stripe_routes;
