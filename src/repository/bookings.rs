use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::domain::availability::ExistingStay;
use crate::domain::booking::BookingStatus;
use crate::error::{AppError, AppResult};

const BOOKING_COLUMNS: &str = "id, reference, property_id, guest_name, guest_email, \
     check_in, check_out, num_guests, base_price_cents, num_nights, subtotal_cents, \
     cleaning_fee_cents, service_fee_cents, taxes_cents, deposit_cents, total_cents, \
     breakdown, status, notes, created_at, confirmed_at, cancelled_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub reference: String,
    pub property_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub base_price_cents: i64,
    pub num_nights: i32,
    pub subtotal_cents: i64,
    pub cleaning_fee_cents: i64,
    pub service_fee_cents: i64,
    pub taxes_cents: i64,
    pub deposit_cents: i64,
    pub total_cents: i64,
    pub breakdown: serde_json::Value,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    /// The stored status as the closed enum. The CHECK constraint keeps
    /// the column inside the enum's vocabulary, so a parse failure
    /// means schema drift, not user input.
    pub fn parsed_status(&self) -> AppResult<BookingStatus> {
        BookingStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!(
                "booking {} carries unknown status '{}'",
                self.id, self.status
            ))
        })
    }

    pub fn as_existing_stay(&self) -> AppResult<ExistingStay> {
        Ok(ExistingStay {
            id: self.id,
            reference: self.reference.clone(),
            status: self.parsed_status()?,
            check_in: self.check_in,
            check_out: self.check_out,
        })
    }
}

/// Insert payload; derived totals come from the quote, never from the
/// caller.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub reference: String,
    pub property_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_guests: i32,
    pub base_price_cents: i64,
    pub num_nights: i32,
    pub subtotal_cents: i64,
    pub cleaning_fee_cents: i64,
    pub service_fee_cents: i64,
    pub taxes_cents: i64,
    pub deposit_cents: i64,
    pub total_cents: i64,
    pub breakdown: serde_json::Value,
}

pub async fn insert_booking(
    executor: impl PgExecutor<'_>,
    booking: &NewBooking,
) -> sqlx::Result<BookingRow> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "INSERT INTO bookings (reference, property_id, guest_name, guest_email,
             check_in, check_out, num_guests, base_price_cents, num_nights,
             subtotal_cents, cleaning_fee_cents, service_fee_cents, taxes_cents,
             deposit_cents, total_cents, breakdown, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending')
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(&booking.reference)
    .bind(booking.property_id)
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(booking.check_in)
    .bind(booking.check_out)
    .bind(booking.num_guests)
    .bind(booking.base_price_cents)
    .bind(booking.num_nights)
    .bind(booking.subtotal_cents)
    .bind(booking.cleaning_fee_cents)
    .bind(booking.service_fee_cents)
    .bind(booking.taxes_cents)
    .bind(booking.deposit_cents)
    .bind(booking.total_cents)
    .bind(&booking.breakdown)
    .fetch_one(executor)
    .await
}

pub async fn get_booking(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> sqlx::Result<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(executor)
    .await
}

pub async fn get_booking_by_reference(
    executor: impl PgExecutor<'_>,
    reference: &str,
) -> sqlx::Result<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE reference = $1"
    ))
    .bind(reference)
    .fetch_optional(executor)
    .await
}

/// Bookings that hold their dates (pending or confirmed) for one
/// property.
pub async fn list_live_for_property(
    executor: impl PgExecutor<'_>,
    property_id: Uuid,
) -> sqlx::Result<Vec<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE property_id = $1 AND status IN ('pending', 'confirmed')
         ORDER BY check_in"
    ))
    .bind(property_id)
    .fetch_all(executor)
    .await
}

pub async fn list_confirmed_in_window(
    executor: impl PgExecutor<'_>,
    from: NaiveDate,
    to: NaiveDate,
) -> sqlx::Result<Vec<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status = 'confirmed' AND check_in >= $1 AND check_in <= $2
         ORDER BY check_in"
    ))
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

/// Status updates are compare-and-set on the status the caller already
/// validated, so two racing transitions cannot both win; `None` means
/// the row moved (or vanished) underneath us.
pub async fn mark_confirmed(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
    from: BookingStatus,
) -> sqlx::Result<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "UPDATE bookings SET status = 'confirmed', confirmed_at = now()
         WHERE id = $1 AND status = $2
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(booking_id)
    .bind(from.as_str())
    .fetch_optional(executor)
    .await
}

/// Cancel and append the reason to the notes trail; notes are never
/// overwritten.
pub async fn mark_cancelled(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
    from: BookingStatus,
    note: &str,
) -> sqlx::Result<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "UPDATE bookings SET status = 'cancelled', cancelled_at = now(),
             notes = trim(both E'\\n' from coalesce(notes, '') || E'\\n' || $3)
         WHERE id = $1 AND status = $2
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(booking_id)
    .bind(from.as_str())
    .bind(note)
    .fetch_optional(executor)
    .await
}

pub async fn mark_status(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
    from: BookingStatus,
    status: BookingStatus,
) -> sqlx::Result<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "UPDATE bookings SET status = $3 WHERE id = $1 AND status = $2
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(booking_id)
    .bind(from.as_str())
    .bind(status.as_str())
    .fetch_optional(executor)
    .await
}

pub async fn delete_booking(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(booking_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
