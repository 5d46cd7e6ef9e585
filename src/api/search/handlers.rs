use crate::api::models::*;
use crate::storage::{Item, ItemFilter};
use axum::{
    Json,
    extract::{Query, State},
};
use tracing::info;

/// Exact-match lookup by `upc` or, failing that, by `keyword` against the
/// item name. Neither parameter means nothing can match.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let filter = match (query.upc, query.keyword) {
        (Some(upc), _) => ItemFilter::Upc(upc),
        (None, Some(keyword)) => ItemFilter::Name(keyword),
        (None, None) => return Ok(Json(Vec::new())),
    };

    info!(field = filter.field(), value = %filter.value(), "Searching");

    let items = state
        .store
        .find(&filter)
        .await
        .map_err(|e| AppError::Internal(format!("Search failed: {}", e)))?;

    info!(found = items.len(), "Search complete");

    Ok(Json(items))
}
