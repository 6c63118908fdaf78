use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Metadata key that ties a hosted checkout session back to the order
/// it was opened for.
pub const METADATA_ORDER_ID: &str = "order_id";

/// One purchasable line on a hosted checkout page. `unit_amount` is in
/// the currency's minor units (cents for USD).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionParams {
    pub line_items: Vec<CheckoutLineItem>,
    pub currency: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub order_id: i64,
}

/// A freshly created hosted session: the provider's id plus the page
/// the shopper should be redirected to.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedSession {
    pub id: String,
    pub url: String,
}

/// A session as read back from the provider after the fact. Fields the
/// provider may omit stay optional.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SessionDetails {
    /// The order this session was opened for, if the metadata carries
    /// a parseable id.
    pub fn order_id(&self) -> Option<i64> {
        self.metadata
            .get(METADATA_ORDER_ID)
            .and_then(|raw| raw.parse().ok())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<HostedSession, GatewayError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError>;
}
