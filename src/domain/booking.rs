use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Closed booking lifecycle. Stored as lowercase text in the database;
/// every mutation goes through [`can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::NoShow)
    }

    /// Only live stays hold their date range against new requests. A
    /// no-show still owns a past range on paper, but blocking on it
    /// would strand the dates, so it counts as released.
    pub fn blocks_availability(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full transition table. Anything not listed here is illegal.
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Cancelled)
            | (Confirmed, Completed)
            | (Confirmed, NoShow)
    )
}

pub fn require_transition(from: BookingStatus, to: BookingStatus) -> Result<(), DomainError> {
    if can_transition(from, to) {
        return Ok(());
    }
    Err(DomainError::InvalidStateTransition { from, to })
}

/// Guest-facing booking reference. Short, unambiguous and distinct from
/// the primary key; uniqueness is enforced by the database index.
pub fn new_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("VR-{}", id[..8].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    const ALL: [BookingStatus; 5] = [Pending, Confirmed, Cancelled, Completed, NoShow];

    #[test]
    fn terminal_states_reject_every_transition() {
        for from in [Cancelled, Completed, NoShow] {
            for to in ALL {
                assert_eq!(
                    require_transition(from, to),
                    Err(crate::domain::DomainError::InvalidStateTransition { from, to }),
                    "{from} -> {to} must be rejected"
                );
            }
        }
    }

    #[test]
    fn lifecycle_follows_the_table() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Confirmed, Cancelled));
        assert!(can_transition(Confirmed, Completed));
        assert!(can_transition(Confirmed, NoShow));

        assert!(!can_transition(Pending, Completed));
        assert!(!can_transition(Pending, NoShow));
        assert!(!can_transition(Confirmed, Pending));
        assert!(!can_transition(Pending, Pending));
    }

    #[test]
    fn status_text_round_trips() {
        for status in ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("checked_in"), None);
    }

    #[test]
    fn references_are_prefixed_and_distinct() {
        let a = new_reference();
        let b = new_reference();
        assert!(a.starts_with("VR-") && a.len() == 11);
        assert!(a[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
