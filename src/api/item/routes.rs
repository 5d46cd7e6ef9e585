use crate::api::item::handlers::submit_item_handler;
use crate::api::models::AppState;
use axum::{Router, routing::post};

pub fn routes() -> Router<AppState> {
    Router::new().route("/item", post(submit_item_handler))
}
