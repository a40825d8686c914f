use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

pub fn validate_input<T: Validate>(input: &T) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::UnprocessableEntity(format!("Validation failed: {errors}")))
}

fn default_one_guest() -> i32 {
    1
}
fn default_owner_block() -> String {
    "owner".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BookingPath {
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReferencePath {
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct PropertyPath {
    pub property_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BlockPath {
    pub block_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_one_guest")]
    pub num_guests: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingInput {
    pub property_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1))]
    #[serde(default = "default_one_guest")]
    pub num_guests: i32,
    #[validate(length(min = 1, max = 255))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingInput {
    /// Present when a guest (rather than an administrator) cancels;
    /// must match the booking's guest email.
    pub guest_email: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlockInput {
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_owner_block")]
    pub block_type: String,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunRemindersInput {
    /// Override "now" for the pass; defaults to the wall clock. Lets an
    /// operator replay or pre-run a day deterministically.
    pub now: Option<chrono::DateTime<chrono::Utc>>,
}
