pub mod availability;
pub mod booking;
pub mod calendar;
pub mod pricing;
pub mod seasons;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use self::booking::BookingStatus;

/// A specific entity the candidate range collides with, kept structured
/// so routes can render a user-facing message naming the culprit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    Booking {
        id: Uuid,
        reference: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    Block {
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StayBound {
    MinNights,
    MaxNights,
}

impl std::fmt::Display for StayBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MinNights => "minimum-nights",
            Self::MaxNights => "maximum-nights",
        })
    }
}

/// Booking-core rule violations. Carried up to the HTTP layer intact so
/// the response can say which rule failed and against what.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    #[error("stay of {nights} nights violates the {limit}-night {bound} policy")]
    PolicyViolation {
        bound: StayBound,
        nights: i64,
        limit: i32,
    },
    #[error("{requested} guests exceeds the property capacity of {max_guests}")]
    Capacity { requested: i32, max_guests: i32 },
    #[error("requested dates conflict with existing bookings or blocked dates")]
    AvailabilityConflict { conflicts: Vec<Conflict> },
    #[error("booking cannot move from {from} to {to}")]
    InvalidStateTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("{0}")]
    Authorization(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}
