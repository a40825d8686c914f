use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::error::{AppError, AppResult};
use crate::repository::bookings::{self, BookingRow};
use crate::repository::reminders as index_repo;
use crate::state::AppState;

/// The slice of a confirmed booking the reminder pass needs.
#[derive(Debug, Clone)]
pub struct UpcomingBooking {
    pub id: Uuid,
    pub reference: String,
    pub guest_email: String,
    pub check_in: NaiveDate,
}

impl From<&BookingRow> for UpcomingBooking {
    fn from(row: &BookingRow) -> Self {
        Self {
            id: row.id,
            reference: row.reference.clone(),
            guest_email: row.guest_email.clone(),
            check_in: row.check_in,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOutcome {
    Sent,
    DispatchFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderResult {
    pub booking_id: Uuid,
    pub reference: String,
    pub threshold_days: i64,
    pub outcome: ReminderOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderRunSummary {
    pub evaluated: u32,
    pub sent: u32,
    pub failed: u32,
    pub results: Vec<ReminderResult>,
}

/// Durable `(booking, threshold)` sent-index. `mark_if_absent` must be
/// compare-and-set: true means this caller claimed the key, false means
/// someone already holds it.
pub trait ReminderIndex {
    async fn mark_if_absent(&mut self, booking_id: Uuid, threshold_days: i64) -> AppResult<bool>;
    async fn unmark(&mut self, booking_id: Uuid, threshold_days: i64) -> AppResult<()>;
}

/// Delivery seam; real impl renders and sends email.
pub trait ReminderDispatch {
    async fn dispatch(
        &mut self,
        booking: &UpcomingBooking,
        days_until: i64,
    ) -> Result<(), DomainError>;
}

/// One reminder pass over the given bookings.
///
/// For each enabled threshold matching the booking's whole-day distance
/// from `today`, claim the index key first, then dispatch. A failed
/// dispatch releases the key so the next run retries; a key already
/// held means some run (this one or a concurrent one) owns the send.
/// Either way no `(booking, threshold)` pair is ever delivered twice,
/// and one bad send never stops the rest of the batch.
pub async fn run_due_reminders<I, D>(
    today: NaiveDate,
    bookings: &[UpcomingBooking],
    thresholds: &[i64],
    index: &mut I,
    dispatch: &mut D,
) -> AppResult<ReminderRunSummary>
where
    I: ReminderIndex,
    D: ReminderDispatch,
{
    let mut summary = ReminderRunSummary::default();

    for booking in bookings {
        summary.evaluated += 1;
        let days_until = (booking.check_in - today).num_days();

        for &threshold in thresholds {
            if days_until != threshold {
                continue;
            }
            if !index.mark_if_absent(booking.id, threshold).await? {
                continue;
            }

            match dispatch.dispatch(booking, days_until).await {
                Ok(()) => {
                    summary.sent += 1;
                    summary.results.push(ReminderResult {
                        booking_id: booking.id,
                        reference: booking.reference.clone(),
                        threshold_days: threshold,
                        outcome: ReminderOutcome::Sent,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        threshold_days = threshold,
                        error = %error,
                        "Reminder dispatch failed; will retry next run"
                    );
                    index.unmark(booking.id, threshold).await?;
                    summary.failed += 1;
                    summary.results.push(ReminderResult {
                        booking_id: booking.id,
                        reference: booking.reference.clone(),
                        threshold_days: threshold,
                        outcome: ReminderOutcome::DispatchFailed,
                    });
                }
            }
        }
    }

    Ok(summary)
}

struct PgReminderIndex {
    pool: PgPool,
}

impl ReminderIndex for PgReminderIndex {
    async fn mark_if_absent(&mut self, booking_id: Uuid, threshold_days: i64) -> AppResult<bool> {
        Ok(index_repo::try_mark_sent(&self.pool, booking_id, threshold_days).await?)
    }

    async fn unmark(&mut self, booking_id: Uuid, threshold_days: i64) -> AppResult<()> {
        Ok(index_repo::unmark_sent(&self.pool, booking_id, threshold_days).await?)
    }
}

struct EmailReminderDispatch {
    state: AppState,
}

impl ReminderDispatch for EmailReminderDispatch {
    async fn dispatch(
        &mut self,
        booking: &UpcomingBooking,
        days_until: i64,
    ) -> Result<(), DomainError> {
        let row = match &self.state.db_pool {
            Some(pool) => bookings::get_booking(pool, booking.id)
                .await
                .map_err(|error| DomainError::Dispatch(error.to_string()))?,
            None => None,
        };
        let row =
            row.ok_or_else(|| DomainError::Dispatch("booking vanished mid-run".to_string()))?;

        let (subject, body) = super::mailer::reminder_email(&row, days_until);
        self.state
            .mailer
            .send(&booking.guest_email, &subject, &body)
            .await
    }
}

/// Load upcoming confirmed bookings and run one pass against Postgres
/// and the real mailer. Invoked by the background loop and by the
/// manual admin trigger.
pub async fn run_reminder_pass(state: &AppState, now: DateTime<Utc>) -> AppResult<ReminderRunSummary> {
    let pool = state
        .db_pool
        .as_ref()
        .ok_or_else(|| AppError::Dependency("Database is not configured.".to_string()))?;

    let today = now.date_naive();
    let horizon = today
        .checked_add_days(Days::new(state.config.reminder_window_days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX);

    let rows = bookings::list_confirmed_in_window(pool, today, horizon).await?;
    let upcoming: Vec<UpcomingBooking> = rows.iter().map(UpcomingBooking::from).collect();

    let mut index = PgReminderIndex { pool: pool.clone() };
    let mut dispatch = EmailReminderDispatch {
        state: state.clone(),
    };

    let summary = run_due_reminders(
        today,
        &upcoming,
        &state.config.reminder_threshold_days,
        &mut index,
        &mut dispatch,
    )
    .await?;

    if summary.sent > 0 || summary.failed > 0 {
        tracing::info!(
            evaluated = summary.evaluated,
            sent = summary.sent,
            failed = summary.failed,
            "Scheduler: reminder pass completed"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Default)]
    struct MemoryIndex {
        keys: HashSet<(Uuid, i64)>,
    }

    impl ReminderIndex for MemoryIndex {
        async fn mark_if_absent(&mut self, booking_id: Uuid, threshold: i64) -> AppResult<bool> {
            Ok(self.keys.insert((booking_id, threshold)))
        }

        async fn unmark(&mut self, booking_id: Uuid, threshold: i64) -> AppResult<()> {
            self.keys.remove(&(booking_id, threshold));
            Ok(())
        }
    }

    /// Records sends; fails the first `fail_first` attempts.
    #[derive(Default)]
    struct RecordingDispatch {
        sent: Vec<(Uuid, i64)>,
        fail_first: u32,
        attempts: u32,
    }

    impl ReminderDispatch for RecordingDispatch {
        async fn dispatch(
            &mut self,
            booking: &UpcomingBooking,
            days_until: i64,
        ) -> Result<(), DomainError> {
            self.attempts += 1;
            if self.attempts <= self.fail_first {
                return Err(DomainError::Dispatch("smtp down".to_string()));
            }
            self.sent.push((booking.id, days_until));
            Ok(())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn booking(check_in: NaiveDate) -> UpcomingBooking {
        UpcomingBooking {
            id: Uuid::new_v4(),
            reference: "VR-ABCD1234".to_string(),
            guest_email: "guest@example.com".to_string(),
            check_in,
        }
    }

    const THRESHOLDS: [i64; 4] = [7, 3, 1, 0];

    #[tokio::test]
    async fn second_run_sends_nothing() {
        let today = d(2026, 6, 1);
        let bookings = vec![booking(d(2026, 6, 8))]; // 7 days out
        let mut index = MemoryIndex::default();
        let mut dispatch = RecordingDispatch::default();

        let first = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(first.sent, 1);
        assert!(index.keys.contains(&(bookings[0].id, 7)));

        let second = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(second.sent, 0);
        assert_eq!(second.evaluated, 1);
        assert_eq!(dispatch.sent.len(), 1);
    }

    #[tokio::test]
    async fn only_matching_thresholds_fire() {
        let today = d(2026, 6, 1);
        let bookings = vec![
            booking(d(2026, 6, 8)),  // 7 days — due
            booking(d(2026, 6, 6)),  // 5 days — not a threshold
            booking(d(2026, 6, 2)),  // 1 day — due
            booking(d(2026, 6, 1)),  // day-of — due
            booking(d(2026, 6, 25)), // 24 days — not due yet
        ];
        let mut index = MemoryIndex::default();
        let mut dispatch = RecordingDispatch::default();

        let summary = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(summary.evaluated, 5);
        assert_eq!(summary.sent, 3);
        assert_eq!(
            dispatch.sent,
            vec![(bookings[0].id, 7), (bookings[2].id, 1), (bookings[3].id, 0)]
        );
    }

    #[tokio::test]
    async fn failed_dispatch_releases_the_key_for_retry() {
        let today = d(2026, 6, 1);
        let bookings = vec![booking(d(2026, 6, 4))]; // 3 days out
        let mut index = MemoryIndex::default();
        let mut dispatch = RecordingDispatch {
            fail_first: 1,
            ..Default::default()
        };

        let first = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(first.sent, 0);
        assert_eq!(first.failed, 1);
        assert_eq!(first.results[0].outcome, ReminderOutcome::DispatchFailed);
        // key released, so the next run retries and succeeds
        assert!(index.keys.is_empty());

        let second = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(second.sent, 1);
        assert!(index.keys.contains(&(bookings[0].id, 3)));
    }

    #[tokio::test]
    async fn one_bad_send_does_not_halt_the_batch() {
        let today = d(2026, 6, 1);
        let bookings = vec![booking(d(2026, 6, 8)), booking(d(2026, 6, 8))];
        let mut index = MemoryIndex::default();
        // first attempt fails, second succeeds
        let mut dispatch = RecordingDispatch {
            fail_first: 1,
            ..Default::default()
        };

        let summary = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(dispatch.sent, vec![(bookings[1].id, 7)]);
    }

    #[tokio::test]
    async fn reset_reenables_sending() {
        let today = d(2026, 6, 1);
        let bookings = vec![booking(d(2026, 6, 8))];
        let mut index = MemoryIndex::default();
        let mut dispatch = RecordingDispatch::default();

        run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(dispatch.sent.len(), 1);

        // administrator reset: clear all keys for the booking
        index.keys.retain(|(id, _)| *id != bookings[0].id);

        let summary = run_due_reminders(today, &bookings, &THRESHOLDS, &mut index, &mut dispatch)
            .await
            .unwrap();
        assert_eq!(summary.sent, 1);
        assert_eq!(dispatch.sent.len(), 2);
    }
}
