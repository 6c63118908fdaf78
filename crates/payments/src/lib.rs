mod error;
mod gateway;
mod stripe;
pub mod webhook;

pub use error::GatewayError;
pub use gateway::{
    CheckoutLineItem, CreateSessionParams, HostedSession, PaymentGateway, SessionDetails,
    METADATA_ORDER_ID,
};
pub use stripe::StripeGateway;
