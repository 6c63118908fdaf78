use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use storefront_common::EnvVars;
use storefront_payments::StripeGateway;
use storefront_service_api::{
    basket_routes, misc_routes, order_routes, setup_tracing, stripe_routes, ApiServerEnv,
    GlobalState,
};
use storefront_store::{connect, init_schema, PgStore};

struct ServiceEnv {
    database_url: String,
}

impl EnvVars for ServiceEnv {
    fn load() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL is not set"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let service_env = ServiceEnv::load();
    let api_env = ApiServerEnv::load();

    let pool = connect(&service_env.database_url).await?;
    init_schema(&pool).await?;

    let stores = PgStore::new(pool).stores();
    let gateway = Arc::new(StripeGateway::new(api_env.stripe_secret_key.clone()));
    let global_state = GlobalState::new(stores, gateway, api_env);

    let app = Router::new()
        .merge(misc_routes())
        .merge(order_routes())
        .merge(basket_routes())
        .merge(stripe_routes())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(cors)
        .layer(trace)
        .with_state(global_state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or("3033".into())
        .parse()
        .expect("failed to convert to number");

    let listener = tokio::net::TcpListener::bind(format!(":::{port}")).await?;

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
