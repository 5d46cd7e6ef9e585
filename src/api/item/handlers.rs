use crate::api::models::*;
use crate::storage::{Item, Location, Price};
use crate::validation::{REQUIRED_FIELDS, Submission, has_required};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::DATE},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

pub const MISSING_FIELDS: &str = "Must fill all required fields";

/// Record one price report as a brand new Item document.
///
/// The body is parsed as JSON whatever its content type. Missing or mistyped
/// fields and store failures all answer `success: false` with HTTP 200.
pub async fn submit_item_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SubmitResponse>, AppError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Body is not valid JSON: {}", e)))?;

    if !has_required(&payload, &REQUIRED_FIELDS) {
        info!("Submission rejected: missing required fields");
        return Ok(Json(SubmitResponse::failure(MISSING_FIELDS)));
    }

    let submission = match Submission::from_payload(&payload) {
        Ok(submission) => submission,
        Err(e) => {
            info!(error = %e, "Submission rejected");
            return Ok(Json(SubmitResponse::failure(e.to_string())));
        }
    };

    info!(upc = %submission.upc, store = %submission.store, "Saving item");

    let price = Price::new(submission.user, submission.price, request_date(&headers));
    let item = Item::reported(
        submission.upc,
        submission.name,
        submission.store,
        Location {
            lat: submission.lat,
            long: submission.long,
        },
        price,
    );

    if let Err(e) = state.store.insert(&item).await {
        warn!(upc = %item.upc, error = %e, "Failed to save item");
        return Ok(Json(SubmitResponse::failure(e.to_string())));
    }

    Ok(Json(SubmitResponse::success()))
}

/// Client's `Date` header, falling back to the time we received the request
fn request_date(headers: &HeaderMap) -> DateTime<Utc> {
    headers
        .get(DATE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .map(|date| date.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
