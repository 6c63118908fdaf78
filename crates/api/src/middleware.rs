use axum::body::Body;
use axum::{extract::Request, response::Response};
use axum::middleware::Next;

use storefront_store::{Stores, User};

use crate::response::AppError;
use crate::utils::extract_bearer_token;

/// Pulls the bearer token out of the request and stashes it as an
/// extension. Requests without a usable header pass through with an
/// empty token; handlers decide whether that is acceptable.
pub async fn authenticate(
    mut req: Request, next: Next
) -> Result<Response<Body>, AppError> {
    let api_key = extract_bearer_token(&req).unwrap_or_default();
    req.extensions_mut().insert(api_key);
    Ok(next.run(req).await)
}

pub async fn ensure_account(
    stores: &Stores, api_key: &str,
) -> Result<Option<User>, AppError> {
    if api_key.is_empty() {
        return Ok(None);
    }

    let user = stores.users.find_by_api_key(api_key).await?;
    Ok(user)
}
