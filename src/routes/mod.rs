pub mod availability;
pub mod blocked_dates;
pub mod bookings;
pub mod health;
pub mod quotes;
pub mod reminders;

use crate::state::AppState;

pub fn v1_router() -> axum::Router<AppState> {
    axum::Router::new()
        .merge(health::router())
        .merge(availability::router())
        .merge(quotes::router())
        .merge(bookings::router())
        .merge(blocked_dates::router())
        .merge(reminders::router())
}

/// Shared accessor: every data route needs the pool and fails the same
/// way without one.
pub(crate) fn db_pool(state: &AppState) -> crate::error::AppResult<&sqlx::PgPool> {
    state.db_pool.as_ref().ok_or_else(|| {
        crate::error::AppError::Dependency(
            "Database is not configured. Set DATABASE_URL.".to_string(),
        )
    })
}
