use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::require_admin;
use crate::error::{AppError, AppResult};
use crate::repository::reminders::reset_for_booking;
use crate::schemas::{BookingPath, RunRemindersInput};
use crate::services::reminders::run_reminder_pass;
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/reminders/run", axum::routing::post(run_now))
        .route(
            "/bookings/{booking_id}/reminders",
            axum::routing::delete(reset_booking_reminders),
        )
}

/// Manual trigger for the reminder pass. Safe to mash: idempotence
/// lives in the sent-index, not in how often this is called.
async fn run_now(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<RunRemindersInput>>,
) -> AppResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let now = payload
        .and_then(|Json(input)| input.now)
        .unwrap_or_else(Utc::now);

    let summary = run_reminder_pass(&state, now).await?;
    Ok(Json(json!({
        "now": now,
        "summary": summary,
    })))
}

/// Clear every sent marker for one booking — the only supported way to
/// re-send a reminder that already went out.
async fn reset_booking_reminders(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;

    if crate::repository::bookings::get_booking(pool, path.booking_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Booking {} not found.",
            path.booking_id
        )));
    }

    let cleared = reset_for_booking(pool, path.booking_id).await?;
    tracing::info!(
        booking_id = %path.booking_id,
        cleared,
        "Reminder index reset"
    );
    Ok(Json(json!({ "cleared": cleared })))
}
