use anyhow::anyhow;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode, middleware,
    response::Redirect,
    routing::{get, post}, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use storefront_payments::{CheckoutLineItem, CreateSessionParams};
use storefront_store::{to_minor_units, OrderContact, OrderItem, StoreError};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState
};

pub fn order_routes() -> Router<GlobalState> {
    Router::new()
        .route("/orders/create",
            post(create_order)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/orders",
            get(list_orders)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/orders/{order_id}",
            get(order_detail)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/orders/success", get(order_success))
        .route("/orders/canceled", get(order_canceled))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
}

impl CheckoutRequest {
    fn validate(&self) -> Result<OrderContact, String> {
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        let email = self.email.trim();
        let address = self.address.trim();

        if first_name.is_empty() || last_name.is_empty() || address.is_empty() {
            return Err("all contact fields are required".to_string());
        }
        if email.is_empty() || !email.contains('@') {
            return Err("a valid email is required".to_string());
        }

        Ok(OrderContact {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            address: address.to_string(),
        })
    }
}

async fn create_order(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Redirect, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[create_order] Unknown api key")))?;

    let contact = payload
        .validate()
        .map_err(|msg| AppError::new(StatusCode::BAD_REQUEST, anyhow!("[create_order] {}", msg)))?;

    // 1. snapshot the basket into order line items
    let lines = state.stores.baskets.lines_for_user(user.id).await?;
    if lines.is_empty() {
        return Err(AppError::new(StatusCode::BAD_REQUEST, anyhow!("[create_order] Basket is empty")));
    }

    let items: Vec<OrderItem> = lines
        .iter()
        .map(|line| OrderItem {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();

    // 2. record the order as pending before talking to the provider
    let order = state.stores.orders
        .create_order(user.id, contact, items)
        .await
        .map_err(|e| match e {
            StoreError::Validation(msg) => AppError::new(StatusCode::BAD_REQUEST, anyhow!("[create_order] {}", msg)),
            other => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[create_order] {}", other)),
        })?;

    // 3. open a hosted session tagged with the order id
    let mut line_items = Vec::with_capacity(lines.len());
    for line in &lines {
        let unit_amount = to_minor_units(line.unit_price)
            .ok_or_else(|| AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                anyhow!("[create_order] Price not representable in minor units: {}", line.unit_price),
            ))?;
        line_items.push(CheckoutLineItem {
            name: line.product_name.clone(),
            unit_amount,
            quantity: line.quantity as i64,
        });
    }

    let params = CreateSessionParams {
        line_items,
        currency: "usd".to_string(),
        customer_email: Some(user.email.clone()),
        success_url: format!("{}/orders/success", state.env.site_url),
        cancel_url: format!("{}/orders/canceled", state.env.site_url),
        order_id: order.id,
    };

    // order stays pending if the provider call fails
    let session = state.gateway
        .create_session(params)
        .await
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("[create_order] Provider error: {}", e)))?;

    tracing::info!("[create_order] Order {} -> session {}", order.id, session.id);
    Ok(Redirect::to(&session.url))
}

async fn list_orders(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[list_orders] Unknown api key")))?;

    let orders = state.stores.orders.orders_for_user(user.id).await?;
    Ok(AppSuccess::new(StatusCode::OK, "Orders fetched successfully", json!(orders)))
}

async fn order_detail(
    State(state): State<GlobalState>,
    Extension(api_key): Extension<String>,
    Path(order_id): Path<i64>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state.stores, &api_key)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("[order_detail] Unknown api key")))?;

    let order = state.stores.orders
        .get_order(order_id)
        .await?
        .filter(|order| order.initiator_id == user.id)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[order_detail] Order not found")))?;

    Ok(AppSuccess::new(StatusCode::OK, "Order fetched successfully", json!(order)))
}

async fn order_success() -> Result<AppSuccess, AppError> {
    Ok(AppSuccess::new(StatusCode::OK, "Payment successful", json!(())))
}

async fn order_canceled() -> Result<AppSuccess, AppError> {
    Ok(AppSuccess::new(StatusCode::OK, "Payment canceled", json!(())))
}
