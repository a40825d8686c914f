use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::DomainError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    Dependency(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Dependency(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Domain(domain) => match domain {
                DomainError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
                DomainError::PolicyViolation { .. }
                | DomainError::Capacity { .. }
                | DomainError::InvalidStateTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::AvailabilityConflict { .. } => StatusCode::CONFLICT,
                DomainError::Authorization(_) => StatusCode::FORBIDDEN,
                DomainError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::UnprocessableEntity(_) => "unprocessable",
            Self::Dependency(_) => "dependency",
            Self::Internal(_) => "internal",
            Self::Domain(domain) => match domain {
                DomainError::InvalidRange { .. } => "invalid_range",
                DomainError::PolicyViolation { .. } => "policy_violation",
                DomainError::Capacity { .. } => "capacity",
                DomainError::AvailabilityConflict { .. } => "availability_conflict",
                DomainError::InvalidStateTransition { .. } => "invalid_state_transition",
                DomainError::Authorization(_) => "authorization",
                DomainError::Dispatch(_) => "dispatch",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "error": self.kind(),
            "detail": self.to_string(),
        });
        if let AppError::Domain(DomainError::AvailabilityConflict { conflicts }) = &self {
            body["conflicts"] = json!(conflicts);
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::NotFound("Record not found.".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23P01") => {
                // bookings_no_live_overlap fired: a concurrent request
                // won the race for the same dates.
                Self::Conflict(
                    "Selected dates were booked by a concurrent request.".to_string(),
                )
            }
            _ => Self::Internal(error.to_string()),
        }
    }
}
