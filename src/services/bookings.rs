use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Actor;
use crate::domain::availability::{
    availability_report, check_availability, AvailabilityReport, StayRequest,
};
use crate::domain::booking::{new_reference, require_transition, BookingStatus};
use crate::domain::pricing::{compute_quote, Quote, QuoteInput};
use crate::domain::DomainError;
use crate::error::{AppError, AppResult};
use crate::repository::bookings::{self, BookingRow, NewBooking};
use crate::repository::catalog::{self, PropertyRow};
use crate::services::mailer;
use crate::state::AppState;

pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub guest_name: String,
    pub guest_email: String,
}

async fn require_active_property(pool: &PgPool, property_id: Uuid) -> AppResult<PropertyRow> {
    let property = catalog::get_property(pool, property_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property {property_id} not found.")))?;
    if !property.is_active {
        return Err(AppError::UnprocessableEntity(
            "Property is not accepting bookings.".to_string(),
        ));
    }
    Ok(property)
}

/// Availability check against the current store, for the guest-facing
/// calendar. The authoritative check re-runs inside [`create_booking`].
pub async fn probe_availability(
    pool: &PgPool,
    property_id: Uuid,
    request: &StayRequest,
) -> AppResult<AvailabilityReport> {
    let property = require_active_property(pool, property_id).await?;
    let existing = bookings::list_live_for_property(pool, property_id)
        .await?
        .iter()
        .map(BookingRow::as_existing_stay)
        .collect::<AppResult<Vec<_>>>()?;
    let blocks: Vec<_> = catalog::list_blocks(pool, property_id)
        .await?
        .iter()
        .map(|row| row.as_owner_block())
        .collect();

    Ok(availability_report(
        &property.rules(),
        request,
        &existing,
        &blocks,
    )?)
}

/// Quote a stay without persisting anything.
pub async fn quote_stay(
    state: &AppState,
    pool: &PgPool,
    property_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> AppResult<(PropertyRow, Quote)> {
    let property = require_active_property(pool, property_id).await?;
    let quote = compute_quote(
        &QuoteInput {
            base_price_cents: property.base_price_cents,
            check_in,
            check_out,
            cleaning_fee_cents: property.cleaning_fee_cents,
            service_fee_bps: state.config.service_fee_bps,
            tax_bps: state.config.tax_bps,
            deposit_cents: property.deposit_cents,
        },
        &state.seasons,
    )?;
    Ok((property, quote))
}

/// Create a PENDING booking. Availability re-check and insert share one
/// transaction, serialized per property by a row lock; the exclusion
/// constraint in the schema backstops anything that still slips
/// through. Nothing persists unless every step succeeds.
pub async fn create_booking(
    state: &AppState,
    pool: &PgPool,
    request: CreateBookingRequest,
) -> AppResult<BookingRow> {
    let property = require_active_property(pool, request.property_id).await?;

    let quote = compute_quote(
        &QuoteInput {
            base_price_cents: property.base_price_cents,
            check_in: request.check_in,
            check_out: request.check_out,
            cleaning_fee_cents: property.cleaning_fee_cents,
            service_fee_bps: state.config.service_fee_bps,
            tax_bps: state.config.tax_bps,
            deposit_cents: property.deposit_cents,
        },
        &state.seasons,
    )?;

    let mut tx = pool.begin().await?;

    catalog::lock_property(&mut *tx, request.property_id).await?;

    let existing = bookings::list_live_for_property(&mut *tx, request.property_id)
        .await?
        .iter()
        .map(BookingRow::as_existing_stay)
        .collect::<AppResult<Vec<_>>>()?;
    let blocks: Vec<_> = catalog::list_blocks(&mut *tx, request.property_id)
        .await?
        .iter()
        .map(|row| row.as_owner_block())
        .collect();

    check_availability(
        &property.rules(),
        &StayRequest {
            check_in: request.check_in,
            check_out: request.check_out,
            num_guests: request.num_guests,
        },
        &existing,
        &blocks,
    )?;

    let created = bookings::insert_booking(
        &mut *tx,
        &NewBooking {
            reference: new_reference(),
            property_id: request.property_id,
            guest_name: request.guest_name,
            guest_email: request.guest_email.trim().to_ascii_lowercase(),
            check_in: request.check_in,
            check_out: request.check_out,
            num_guests: request.num_guests,
            base_price_cents: property.base_price_cents,
            num_nights: quote.nights as i32,
            subtotal_cents: quote.subtotal_cents,
            cleaning_fee_cents: quote.cleaning_fee_cents,
            service_fee_cents: quote.service_fee_cents,
            taxes_cents: quote.taxes_cents,
            deposit_cents: quote.deposit_cents,
            total_cents: quote.total_cents,
            breakdown: serde_json::to_value(&quote.per_night)
                .map_err(|error| AppError::Internal(error.to_string()))?,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        booking_id = %created.id,
        reference = %created.reference,
        property_id = %created.property_id,
        total_cents = created.total_cents,
        "Booking created"
    );
    Ok(created)
}

async fn require_booking(pool: &PgPool, booking_id: Uuid) -> AppResult<BookingRow> {
    bookings::get_booking(pool, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found.")))
}

/// The status updates are compare-and-set against the status we just
/// validated; a miss means a concurrent transition won the race, which
/// reads the same as an invalid transition from the loser's view.
fn updated_or_lost_race(
    updated: Option<BookingRow>,
    from: BookingStatus,
    to: BookingStatus,
) -> AppResult<BookingRow> {
    updated.ok_or_else(|| DomainError::InvalidStateTransition { from, to }.into())
}

/// Confirm a pending booking. The confirmation email is best effort:
/// the status change commits first and a failed send is only logged.
pub async fn confirm_booking(state: &AppState, pool: &PgPool, booking_id: Uuid) -> AppResult<BookingRow> {
    let booking = require_booking(pool, booking_id).await?;
    let from = booking.parsed_status()?;
    require_transition(from, BookingStatus::Confirmed)?;

    let confirmed = updated_or_lost_race(
        bookings::mark_confirmed(pool, booking_id, from).await?,
        from,
        BookingStatus::Confirmed,
    )?;
    tracing::info!(booking_id = %booking_id, reference = %confirmed.reference, "Booking confirmed");

    let (subject, body) = mailer::confirmation_email(&confirmed);
    if let Err(error) = state.mailer.send(&confirmed.guest_email, &subject, &body).await {
        tracing::warn!(
            booking_id = %booking_id,
            error = %error,
            "Confirmation email failed; booking remains confirmed"
        );
    }

    Ok(confirmed)
}

/// Cancel a booking on behalf of its owning guest or an administrator.
pub async fn cancel_booking(
    pool: &PgPool,
    booking_id: Uuid,
    actor: &Actor,
    reason: Option<&str>,
) -> AppResult<BookingRow> {
    let booking = require_booking(pool, booking_id).await?;

    match actor {
        Actor::Admin => {}
        Actor::Guest { email } if *email == booking.guest_email => {}
        _ => {
            return Err(DomainError::Authorization(
                "Only the booking's guest or an administrator may cancel it.".to_string(),
            )
            .into())
        }
    }

    let from = booking.parsed_status()?;
    require_transition(from, BookingStatus::Cancelled)?;

    let actor_label = match actor {
        Actor::Admin => "admin",
        _ => "guest",
    };
    let note = format!(
        "[{}] cancelled by {actor_label}: {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        reason.unwrap_or("no reason given"),
    );
    let cancelled = updated_or_lost_race(
        bookings::mark_cancelled(pool, booking_id, from, &note).await?,
        from,
        BookingStatus::Cancelled,
    )?;
    tracing::info!(booking_id = %booking_id, actor = actor_label, "Booking cancelled");
    Ok(cancelled)
}

/// Mark a confirmed stay completed or no-show (administrator action).
pub async fn close_booking(
    pool: &PgPool,
    booking_id: Uuid,
    target: BookingStatus,
) -> AppResult<BookingRow> {
    let booking = require_booking(pool, booking_id).await?;
    let from = booking.parsed_status()?;
    require_transition(from, target)?;
    let updated = updated_or_lost_race(
        bookings::mark_status(pool, booking_id, from, target).await?,
        from,
        target,
    )?;
    tracing::info!(booking_id = %booking_id, status = %target, "Booking closed");
    Ok(updated)
}

/// Administrator hard delete. Refused while the booking still holds a
/// live future stay; cancel first. Reminder-index rows go with it via
/// ON DELETE CASCADE.
pub async fn delete_booking(pool: &PgPool, booking_id: Uuid, today: NaiveDate) -> AppResult<()> {
    let booking = require_booking(pool, booking_id).await?;
    let status = booking.parsed_status()?;

    if status.blocks_availability() && booking.check_out > today {
        return Err(AppError::Conflict(format!(
            "Booking {} is a live {} stay ending {}; cancel it before deleting.",
            booking.reference, status, booking.check_out
        )));
    }

    bookings::delete_booking(pool, booking_id).await?;
    tracing::info!(booking_id = %booking_id, reference = %booking.reference, "Booking hard-deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> BookingRow {
        BookingRow {
            id: Uuid::new_v4(),
            reference: "VR-TESTTEST".to_string(),
            property_id: Uuid::new_v4(),
            guest_name: "Ada Guest".to_string(),
            guest_email: "ada@example.com".to_string(),
            check_in: NaiveDate::from_ymd_opt(2026, 4, 6).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 4, 11).unwrap(),
            num_guests: 2,
            base_price_cents: 20_000,
            num_nights: 5,
            subtotal_cents: 100_000,
            cleaning_fee_cents: 8_000,
            service_fee_cents: 12_000,
            taxes_cents: 12_000,
            deposit_cents: 0,
            total_cents: 132_000,
            breakdown: serde_json::json!([]),
            status: status.to_string(),
            notes: None,
            created_at: Utc::now(),
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn winning_status_update_passes_through() {
        let updated = updated_or_lost_race(
            Some(row("confirmed")),
            BookingStatus::Pending,
            BookingStatus::Confirmed,
        )
        .unwrap();
        assert_eq!(updated.status, "confirmed");
    }

    #[test]
    fn concurrent_transition_loser_gets_a_transition_error() {
        // A cancel that lands after a racing confirm finds zero rows
        // matching its expected status and must not silently succeed.
        let error = updated_or_lost_race(None, BookingStatus::Pending, BookingStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(
            error,
            AppError::Domain(DomainError::InvalidStateTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Cancelled,
            })
        ));
    }
}
