use anyhow::anyhow;
use axum::{
    http::{HeaderMap, StatusCode},
    extract::State,
    routing::post, Router,
};
use serde_json::json;

use storefront_payments::webhook::{self, CHECKOUT_SESSION_COMPLETED};

use crate::{
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn stripe_routes() -> Router<GlobalState> {
    Router::new()
        .route("/stripe/webhook", post(stripe_webhook))
}

async fn stripe_webhook(
    State(state): State<GlobalState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<AppSuccess, AppError> {
    let sig = headers
        .get("stripe-signature")
        .and_then(|s| s.to_str().ok())
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, anyhow!("Missing stripe-signature header")))?;

    // signature covers the raw body, so verify before any parsing
    let event = webhook::construct_event(&body, sig, &state.env.stripe_webhook_secret)
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, anyhow!("Webhook error: {}", e)))?;

    if event.event_type != CHECKOUT_SESSION_COMPLETED {
        return Ok(AppSuccess::new(StatusCode::OK, "Webhook received", json!({})));
    }

    let session_id = event
        .data
        .object
        .id
        .clone()
        .ok_or_else(|| AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[stripe_webhook] Completed event {} has no session id", event.id),
        ))?;

    // delivered payloads are not trusted; re-read the session from the
    // provider and act on that copy
    let session = state.gateway
        .retrieve_session(&session_id)
        .await
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[stripe_webhook] Provider error: {}", e)))?;

    let order_id = session
        .order_id()
        .ok_or_else(|| AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow!("[stripe_webhook] Session {} has no usable order id", session_id),
        ))?;

    state.stores.orders
        .mark_paid(order_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[stripe_webhook] Order {} not found for session {}", order_id, session_id))
            } else {
                AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[stripe_webhook] {}", e))
            }
        })?;

    tracing::info!("[stripe_webhook] Order {} paid via session {}", order_id, session_id);
    Ok(AppSuccess::new(StatusCode::OK, "Webhook received", json!({})))
}
