use anyhow::anyhow;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode, middleware,
    routing::{get, post}, Router,
};
use serde_json::json;

use storefront_store::StoreError;

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn basket_routes() -> Router<GlobalState> {
    Router::new()
        .route("/basket",
            get(get_basket)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/basket/add/{product_id}",
            post(add_to_basket)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/basket/remove/{item_id}",
            post(remove_from_basket)
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn get_basket(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[get_basket] Unknown api key")))?;

    let lines = state.stores.baskets.lines_for_user(user.id).await?;
    Ok(AppSuccess::new(StatusCode::OK, "Basket fetched successfully", json!(lines)))
}

async fn add_to_basket(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
    Path(product_id): Path<i64>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[add_to_basket] Unknown api key")))?;

    let line = state.stores.baskets
        .add_product(user.id, product_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(what) => AppError::new(StatusCode::NOT_FOUND, anyhow!("[add_to_basket] {} not found", what)),
            other => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[add_to_basket] {}", other)),
        })?;

    Ok(AppSuccess::new(StatusCode::OK, "Added to basket successfully", json!(line)))
}

async fn remove_from_basket(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
    Path(item_id): Path<i64>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[remove_from_basket] Unknown api key")))?;

    state.stores.baskets
        .remove_line(user.id, item_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(what) => AppError::new(StatusCode::NOT_FOUND, anyhow!("[remove_from_basket] {} not found", what)),
            other => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[remove_from_basket] {}", other)),
        })?;

    Ok(AppSuccess::new(StatusCode::OK, "Removed from basket successfully", json!(())))
}
