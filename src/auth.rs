use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Who is asking. Authentication itself (sessions, magic links) lives
/// upstream; this core only needs enough identity to enforce who may
/// cancel, confirm or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Guest { email: String },
    Anonymous,
}

fn admin_key_matches(state: &AppState, headers: &HeaderMap) -> bool {
    let presented = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match (&state.config.admin_api_key, presented) {
        (Some(expected), Some(given)) => expected == given,
        // No key configured: open in development, locked in production.
        (None, _) => !state.config.is_production(),
        (Some(_), None) => false,
    }
}

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    if admin_key_matches(state, headers) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "This operation requires an administrator key.".to_string(),
    ))
}

/// Resolve the acting party for guest-or-admin operations. A valid
/// admin key wins; otherwise a claimed guest email identifies the
/// caller, to be matched against the booking it targets.
pub fn resolve_actor(state: &AppState, headers: &HeaderMap, guest_email: Option<&str>) -> Actor {
    if admin_key_matches(state, headers) {
        return Actor::Admin;
    }
    match guest_email.map(str::trim).filter(|email| !email.is_empty()) {
        Some(email) => Actor::Guest {
            email: email.to_ascii_lowercase(),
        },
        None => Actor::Anonymous,
    }
}
