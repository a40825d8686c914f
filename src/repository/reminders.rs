use sqlx::PgExecutor;
use uuid::Uuid;

/// Insert-if-absent on the durable reminder-sent index. Returns true
/// when this call claimed the `(booking, threshold)` key, false when
/// another run already holds it — safe under overlapping invocations.
pub async fn try_mark_sent(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
    threshold_days: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO reminder_sent (booking_id, threshold_days)
         VALUES ($1, $2)
         ON CONFLICT (booking_id, threshold_days) DO NOTHING",
    )
    .bind(booking_id)
    .bind(threshold_days as i32)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Release one key, re-arming the retry path after a failed dispatch.
pub async fn unmark_sent(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
    threshold_days: i64,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM reminder_sent WHERE booking_id = $1 AND threshold_days = $2")
        .bind(booking_id)
        .bind(threshold_days as i32)
        .execute(executor)
        .await?;
    Ok(())
}

/// Administrator reset: clear every sent marker for one booking so
/// reminders may fire again.
pub async fn reset_for_booking(
    executor: impl PgExecutor<'_>,
    booking_id: Uuid,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM reminder_sent WHERE booking_id = $1")
        .bind(booking_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
