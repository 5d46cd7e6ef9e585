pub mod item;
pub mod models;
pub mod search;

// Re-exports
pub use models::*;

use axum::{
    Json, Router,
    extract::State,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub const GREETING: &str = "Hello, Grocery buddies!";

/// Every route the service exposes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(item::routes())
        .merge(search::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn root_handler() -> &'static str {
    GREETING
}

pub async fn health_handler(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let total_items = state.store.count().await.unwrap_or(0);
    Json(models::HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend().to_string(),
        total_items,
    })
}
