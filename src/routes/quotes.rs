use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::schemas::{validate_input, QuoteRequest};
use crate::services::bookings::quote_stay;
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route("/quotes", axum::routing::post(create_quote))
}

/// Price a stay without persisting anything. The same calculator runs
/// again at creation time, so a quote is always what the booking would
/// cost right now.
async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<Value>> {
    validate_input(&payload)?;
    let pool = super::db_pool(&state)?;

    let (property, quote) = quote_stay(
        &state,
        pool,
        payload.property_id,
        payload.check_in,
        payload.check_out,
    )
    .await?;

    Ok(Json(json!({
        "property_id": property.id,
        "property_name": property.name,
        "check_in": payload.check_in,
        "check_out": payload.check_out,
        "quote": quote,
    })))
}
