//! Verification and parsing of provider webhook deliveries.
//!
//! The provider signs every delivery with the endpoint's shared
//! secret: the header carries `t={timestamp},v1={hex hmac}` where the
//! hmac covers `{timestamp}.{raw body}`. Nothing in the body is
//! trusted until that signature checks out.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use storefront_common::get_current_timestamp;

use crate::error::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Event type sent once the shopper completes a hosted checkout page.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Maximum accepted age of a delivery, in seconds.
pub const DEFAULT_TOLERANCE: i64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookObject,
}

/// The object an event is about. Only the id matters here, and not
/// every event type carries one: handlers re-read the full object from
/// the provider instead of trusting the delivered copy.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    pub id: Option<String>,
}

/// Checks the signature over the raw body, then parses the event.
/// Rejects deliveries older than [`DEFAULT_TOLERANCE`].
pub fn construct_event(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<WebhookEvent, GatewayError> {
    verify_signature(payload, sig_header, secret, get_current_timestamp())?;
    Ok(serde_json::from_slice(payload)?)
}

fn verify_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), GatewayError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for element in sig_header.split(',') {
        match element.trim().split_once('=') {
            Some(("t", raw)) => timestamp = raw.parse().ok(),
            Some(("v1", raw)) => {
                if let Ok(decoded) = hex::decode(raw) {
                    candidates.push(decoded);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| GatewayError::BadSignature("no timestamp in header".to_string()))?;
    if candidates.is_empty() {
        return Err(GatewayError::BadSignature(
            "no v1 signature in header".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::BadSignature("invalid webhook secret".to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice is constant-time; any matching v1 entry passes
    if !candidates
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok())
    {
        return Err(GatewayError::BadSignature(
            "no v1 signature matched".to_string(),
        ));
    }

    if now - timestamp > DEFAULT_TOLERANCE {
        return Err(GatewayError::BadSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    Ok(())
}
