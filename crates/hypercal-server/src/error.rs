//! Server error types.
//!
//! Every request error maps to a stable status and code and is returned as
//! a JSON body:
//!
//! ```json
//! {"error": {"code": "UNKNOWN_PREFERENCE", "message": "..."}}
//! ```

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use hypercal_core::{FeedError, FeedErrorKind};

use crate::config::ConfigError;
use crate::store::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A required query parameter is absent.
    #[error("The '{name}' parameter is missing in the query")]
    MissingParameter { name: &'static str },

    /// The ignore list or the override map is not valid JSON of the
    /// expected shape.
    #[error("Invalid '{name}' parameter: {reason}")]
    InvalidFilterInput { name: &'static str, reason: String },

    /// A feed could not be obtained.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// No preference is registered under the identifier.
    #[error("No preference registered under {id}")]
    UnknownPreference { id: String },

    /// The registration body is not an acceptable preference record.
    #[error("Invalid registration: {reason}")]
    InvalidRegistration { reason: String },

    /// The preference store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error (listener, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ServerError {
    /// Creates a missing parameter error.
    pub fn missing(name: &'static str) -> Self {
        Self::MissingParameter { name }
    }

    /// Creates an invalid filter input error.
    pub fn invalid_filter(name: &'static str, reason: impl ToString) -> Self {
        Self::InvalidFilterInput {
            name,
            reason: reason.to_string(),
        }
    }

    /// Creates an unknown preference error.
    pub fn unknown_preference(id: impl Into<String>) -> Self {
        Self::UnknownPreference { id: id.into() }
    }

    /// Creates an invalid registration error.
    pub fn invalid_registration(reason: impl ToString) -> Self {
        Self::InvalidRegistration {
            reason: reason.to_string(),
        }
    }

    /// Returns the HTTP status and the machine-readable code of this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingParameter { .. } => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            Self::InvalidFilterInput { .. } => {
                (StatusCode::PRECONDITION_FAILED, "INVALID_FILTER_INPUT")
            }
            Self::Feed(e) => match e.kind() {
                FeedErrorKind::MalformedFeedUrl => (StatusCode::BAD_REQUEST, "MALFORMED_FEED_URL"),
                FeedErrorKind::UnsupportedFeedUrl => {
                    (StatusCode::PRECONDITION_FAILED, "UNSUPPORTED_FEED_URL")
                }
                FeedErrorKind::SourceUnreachable => (StatusCode::BAD_GATEWAY, "SOURCE_UNREACHABLE"),
                FeedErrorKind::EmptySourceCalendar => {
                    (StatusCode::NOT_FOUND, "EMPTY_SOURCE_CALENDAR")
                }
            },
            Self::UnknownPreference { .. } => (StatusCode::NOT_FOUND, "UNKNOWN_PREFERENCE"),
            Self::InvalidRegistration { .. } => {
                (StatusCode::PRECONDITION_FAILED, "INVALID_REGISTRATION")
            }
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            Self::Config(_) | Self::Io(_) | Self::HttpClient(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!(error = %self, code, "Request failed");
        } else {
            warn!(error = %self, code, "Request rejected");
        }

        // Feed failures are reported as-is even when they map to 502.
        let message = match &self {
            Self::Feed(e) => e.to_string(),
            Self::Store(_) => "The preference store is unavailable".to_string(),
            _ if status.is_server_error() => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };
        (status, Json(body)).into_response()
    }
}
