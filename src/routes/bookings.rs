use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::auth::{require_admin, resolve_actor};
use crate::domain::booking::BookingStatus;
use crate::error::{AppError, AppResult};
use crate::repository::bookings::{get_booking, get_booking_by_reference, BookingRow};
use crate::schemas::{validate_input, BookingPath, CancelBookingInput, CreateBookingInput, ReferencePath};
use crate::services::bookings as booking_service;
use crate::state::AppState;

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/bookings", axum::routing::post(create_booking))
        .route(
            "/bookings/{booking_id}",
            axum::routing::get(get_one).delete(hard_delete),
        )
        .route(
            "/bookings/by-reference/{reference}",
            axum::routing::get(get_by_reference),
        )
        .route(
            "/bookings/{booking_id}/confirm",
            axum::routing::post(confirm),
        )
        .route("/bookings/{booking_id}/cancel", axum::routing::post(cancel))
        .route(
            "/bookings/{booking_id}/complete",
            axum::routing::post(complete),
        )
        .route(
            "/bookings/{booking_id}/no-show",
            axum::routing::post(no_show),
        )
}

async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingInput>,
) -> AppResult<impl IntoResponse> {
    validate_input(&payload)?;
    let pool = super::db_pool(&state)?;

    let created = booking_service::create_booking(
        &state,
        pool,
        booking_service::CreateBookingRequest {
            property_id: payload.property_id,
            check_in: payload.check_in,
            check_out: payload.check_out,
            num_guests: payload.num_guests,
            guest_name: payload.guest_name,
            guest_email: payload.guest_email,
        },
    )
    .await?;

    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
) -> AppResult<Json<BookingRow>> {
    let pool = super::db_pool(&state)?;
    let booking = get_booking(pool, path.booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found.", path.booking_id)))?;
    Ok(Json(booking))
}

async fn get_by_reference(
    State(state): State<AppState>,
    Path(path): Path<ReferencePath>,
) -> AppResult<Json<BookingRow>> {
    let pool = super::db_pool(&state)?;
    let reference = path.reference.trim().to_ascii_uppercase();
    let booking = get_booking_by_reference(pool, &reference)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking '{reference}' not found.")))?;
    Ok(Json(booking))
}

async fn confirm(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
) -> AppResult<Json<BookingRow>> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    let confirmed = booking_service::confirm_booking(&state, pool, path.booking_id).await?;
    Ok(Json(confirmed))
}

async fn cancel(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
    Json(payload): Json<CancelBookingInput>,
) -> AppResult<Json<BookingRow>> {
    let pool = super::db_pool(&state)?;
    let actor = resolve_actor(&state, &headers, payload.guest_email.as_deref());
    let cancelled =
        booking_service::cancel_booking(pool, path.booking_id, &actor, payload.reason.as_deref())
            .await?;
    Ok(Json(cancelled))
}

async fn complete(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
) -> AppResult<Json<BookingRow>> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    let updated =
        booking_service::close_booking(pool, path.booking_id, BookingStatus::Completed).await?;
    Ok(Json(updated))
}

async fn no_show(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
) -> AppResult<Json<BookingRow>> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    let updated =
        booking_service::close_booking(pool, path.booking_id, BookingStatus::NoShow).await?;
    Ok(Json(updated))
}

async fn hard_delete(
    State(state): State<AppState>,
    Path(path): Path<BookingPath>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    let pool = super::db_pool(&state)?;
    booking_service::delete_booking(pool, path.booking_id, Utc::now().date_naive()).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
