use std::sync::Arc;

use storefront_payments::PaymentGateway;
use storefront_store::Stores;

use crate::env::ApiServerEnv;

#[derive(Clone)]
pub struct GlobalState {
    pub stores: Stores,
    pub gateway: Arc<dyn PaymentGateway>,
    pub env: Arc<ApiServerEnv>,
}

impl GlobalState {
    pub fn new(stores: Stores, gateway: Arc<dyn PaymentGateway>, env: ApiServerEnv) -> Self {
        Self {
            stores,
            gateway,
            env: Arc::new(env),
        }
    }
}
