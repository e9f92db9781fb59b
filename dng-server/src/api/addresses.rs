//! Address endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::models::AggregatedRecord;
use crate::{ApiError, ApiResult, AppState};

/// Query string of `GET /addressinfo`
#[derive(Debug, Deserialize)]
pub struct AddressInfoQuery {
    pub address: Option<String>,
}

/// Form body of `POST /savenotes`
#[derive(Debug, Deserialize)]
pub struct SaveNotesForm {
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Reject absent or blank addresses
fn required_address(address: Option<String>) -> ApiResult<String> {
    match address {
        Some(address) if !address.trim().is_empty() => Ok(address),
        _ => Err(ApiError::BadRequest("address is required".to_string())),
    }
}

/// GET /addresses
pub async fn list_addresses(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.addresses.as_ref().clone())
}

/// GET /addressinfo?address=...
///
/// Serves the stored record, building it first if this is the first request
/// for the address.
///
/// **Errors:**
/// - 400 Bad Request: missing or blank address
/// - 422 Unprocessable Entity: address could not be geocoded
/// - 500 Internal Server Error: store failure
pub async fn address_info(
    State(state): State<AppState>,
    Query(query): Query<AddressInfoQuery>,
) -> ApiResult<Json<AggregatedRecord>> {
    let address = required_address(query.address)?;

    let resolved = state.aggregator.resolve(&address).await?;
    if resolved.freshly_built {
        info!(address = %address, "Built record on request");
    }

    Ok(Json(resolved.record))
}

/// POST /savenotes
///
/// Overwrites the notes of an address. An empty `notes` field clears them.
pub async fn save_notes(
    State(state): State<AppState>,
    Form(form): Form<SaveNotesForm>,
) -> ApiResult<StatusCode> {
    let address = required_address(form.address)?;
    let notes = form
        .notes
        .ok_or_else(|| ApiError::BadRequest("notes is required".to_string()))?;

    state.notes.set_notes(&address, &notes).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Build address routes
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list_addresses))
        .route("/addressinfo", get(address_info))
        .route("/savenotes", post(save_notes))
}
