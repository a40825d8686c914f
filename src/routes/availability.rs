use axum::extract::{Path, Query, State};
use axum::Json;

use crate::domain::availability::{AvailabilityReport, StayRequest};
use crate::error::AppResult;
use crate::schemas::{AvailabilityQuery, PropertyPath};
use crate::services::bookings::probe_availability;
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/properties/{property_id}/availability",
        axum::routing::get(check_availability),
    )
}

/// Guest-facing availability probe. Overlaps come back as a 200 with
/// the conflicting entries so the calendar can show *why* dates are
/// taken; malformed ranges and policy violations are real errors.
async fn check_availability(
    State(state): State<AppState>,
    Path(path): Path<PropertyPath>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityReport>> {
    let pool = super::db_pool(&state)?;

    let report = probe_availability(
        pool,
        path.property_id,
        &StayRequest {
            check_in: query.check_in,
            check_out: query.check_out,
            num_guests: query.num_guests,
        },
    )
    .await?;

    Ok(Json(report))
}
