use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;

use crate::state::AppState;

/// Background loop driving the reminder pass. Each pass runs in its own
/// `tokio::spawn` so a failure never crashes the loop, and overlapping
/// passes stay correct because the sent-index is compare-and-set.
pub async fn run_background_scheduler(state: AppState) {
    if state.db_pool.is_none() {
        tracing::warn!("Scheduler: no database pool configured, exiting");
        return;
    }

    let interval =
        Duration::from_secs(state.config.reminder_run_interval_minutes.max(1) * 60);
    tracing::info!(
        interval_minutes = state.config.reminder_run_interval_minutes.max(1),
        thresholds = ?state.config.reminder_threshold_days,
        "Background scheduler started"
    );

    loop {
        sleep(interval).await;

        let state = state.clone();
        tokio::spawn(async move {
            match crate::services::reminders::run_reminder_pass(&state, Utc::now()).await {
                Ok(summary) => {
                    if summary.sent > 0 {
                        tracing::info!(
                            sent = summary.sent,
                            evaluated = summary.evaluated,
                            "Scheduler: reminders dispatched"
                        );
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Scheduler: reminder pass failed");
                }
            }
        });
    }
}
