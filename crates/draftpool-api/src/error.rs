//! Draftpool — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use draftpool_core::error::DomainError;
use draftpool_draft::application::query_handlers::DraftStatusView;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or span export could not be set up.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Draft status at rejection time, for rejections caused by a stale view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<DraftStatusView>,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError {
    /// The rejection.
    pub error: DomainError,
    /// Current draft status to send back with the rejection.
    pub current: Option<Box<DraftStatusView>>,
}

impl ApiError {
    /// Attaches the current draft status to the response.
    #[must_use]
    pub fn with_current(mut self, current: DraftStatusView) -> Self {
        self.current = Some(Box::new(current));
        self
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self {
            error,
            current: None,
        }
    }
}

fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation(_) | DomainError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        DomainError::NotLeagueCreator { .. } | DomainError::NotLeagueMember { .. } => {
            StatusCode::FORBIDDEN
        }
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::State { .. } | DomainError::TurnViolation { .. } | DomainError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        DomainError::ConcurrencyConflict { .. } | DomainError::Infrastructure(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.error);
        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self.error, "request failed");
        }

        let body = ErrorBody {
            error: self.error.code(),
            message: self.error.to_string(),
            current: self.current.map(|c| *c),
        };

        (status, Json(body)).into_response()
    }
}
