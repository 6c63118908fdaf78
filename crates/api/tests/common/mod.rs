#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

use storefront_payments::{
    CreateSessionParams, GatewayError, HostedSession, PaymentGateway, SessionDetails,
    METADATA_ORDER_ID,
};
use storefront_service_api::{
    basket_routes, misc_routes, order_routes, stripe_routes, ApiServerEnv, GlobalState,
};
use storefront_store::MemoryStore;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const SITE_URL: &str = "https://store.test";

/// In-process stand-in for the payment provider. Successful session
/// creates are recorded and immediately retrievable, the way a real
/// hosted session would be.
#[derive(Clone, Default)]
pub struct MockGateway {
    pub created: Arc<Mutex<Vec<CreateSessionParams>>>,
    pub sessions: Arc<Mutex<HashMap<String, SessionDetails>>>,
    fail_create: bool,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn insert_session(&self, details: SessionDetails) {
        self.sessions
            .lock()
            .unwrap()
            .insert(details.id.clone(), details);
    }

    pub fn created_params(&self) -> Vec<CreateSessionParams> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<HostedSession, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::Provider("stripe is down".to_string()));
        }

        let mut created = self.created.lock().unwrap();
        let id = format!("cs_test_{}", created.len() + 1);
        let url = format!("https://checkout.stripe.test/pay/{id}");

        let mut metadata = HashMap::new();
        metadata.insert(METADATA_ORDER_ID.to_string(), params.order_id.to_string());
        self.sessions.lock().unwrap().insert(
            id.clone(),
            SessionDetails {
                id: id.clone(),
                url: Some(url.clone()),
                payment_status: Some("paid".to_string()),
                metadata,
            },
        );

        created.push(params);
        Ok(HostedSession { id, url })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionDetails, GatewayError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::Provider(format!("No such checkout session: {session_id}")))
    }
}

pub fn test_env() -> ApiServerEnv {
    ApiServerEnv {
        stripe_secret_key: "sk_test_123".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        site_url: SITE_URL.to_string(),
    }
}

pub fn build_app(store: &MemoryStore, gateway: MockGateway) -> Router {
    let state = GlobalState::new(store.stores(), Arc::new(gateway), test_env());
    Router::new()
        .merge(order_routes())
        .merge(basket_routes())
        .merge(stripe_routes())
        .merge(misc_routes())
        .with_state(state)
}

pub fn stripe_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

pub fn completed_event(session_id: &str) -> Vec<u8> {
    event_payload("checkout.session.completed", session_id)
}

pub fn event_payload(event_type: &str, object_id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_1",
        "type": event_type,
        "data": { "object": { "id": object_id } },
    })
    .to_string()
    .into_bytes()
}

pub fn bare_object_event(event_type: &str) -> Vec<u8> {
    serde_json::json!({
        "id": "evt_1",
        "type": event_type,
        "data": { "object": {} },
    })
    .to_string()
    .into_bytes()
}

pub fn contact_payload() -> serde_json::Value {
    serde_json::json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "address": "12 Analytical Row",
    })
}

pub fn authed_post(uri: &str, api_key: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {api_key}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_get(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {api_key}"))
        .body(Body::empty())
        .unwrap()
}

pub fn webhook_request(payload: &[u8], sig_header: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/stripe/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = sig_header {
        builder = builder.header("stripe-signature", sig);
    }
    builder.body(Body::from(payload.to_vec())).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
