//! Error types for the gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::JobId;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// How a failure is surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before touching any store or queue
    InvalidInput,
    /// Status key absent (never submitted, or expired)
    NotFound,
    /// A collaborator (store, queue, storage) failed
    Infrastructure,
}

/// Gateway errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client sent an unusable request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body over the configured upload limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// No status entry for this job
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Status store read/write failed
    #[error("Status store error: {0}")]
    StatusStore(String),

    /// Job queue failure outside of a submission (health, flush)
    #[error("Job queue error: {0}")]
    JobQueue(String),

    /// Enqueue failed after the write-ahead status was recorded
    #[error("Failed to enqueue job {job_id} (status compensated: {compensated}): {message}")]
    EnqueueFailed {
        job_id: JobId,
        compensated: bool,
        message: String,
    },

    /// Upload storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a status store error
    pub fn status_store(message: impl Into<String>) -> Self {
        Self::StatusStore(message.into())
    }

    /// Create a job queue error
    pub fn job_queue(message: impl Into<String>) -> Self {
        Self::JobQueue(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Category the caller uses to decide between fixing input, giving up, or retrying
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidInput(_) | Error::PayloadTooLarge(_) => ErrorCategory::InvalidInput,
            Error::JobNotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::Infrastructure,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match (&self, self.category()) {
            (Error::PayloadTooLarge(_), _) => StatusCode::PAYLOAD_TOO_LARGE,
            (_, ErrorCategory::InvalidInput) => StatusCode::BAD_REQUEST,
            (_, ErrorCategory::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorCategory::Infrastructure) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let (error_type, message) = match &self {
            Error::Config(msg) => ("config_error", msg.clone()),
            Error::InvalidInput(msg) => ("bad_request", msg.clone()),
            Error::PayloadTooLarge(msg) => ("payload_too_large", msg.clone()),
            Error::JobNotFound(id) => ("not_found", format!("job not found: {}", id)),
            Error::StatusStore(_) => ("status_store_error", self.to_string()),
            Error::JobQueue(_) => ("queue_error", self.to_string()),
            // The job id stays in the logs; callers get no id for a failed submission
            Error::EnqueueFailed { .. } => ("queue_error", "failed to queue job".to_string()),
            Error::Storage(_) | Error::Io(_) => ("storage_error", self.to_string()),
            Error::Json(err) => ("internal_error", err.to_string()),
            Error::Http(err) => ("internal_error", err.to_string()),
            Error::Internal(msg) => ("internal_error", msg.clone()),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::invalid_input("file is required").category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            Error::JobNotFound("abc".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            Error::status_store("connection refused").category(),
            ErrorCategory::Infrastructure
        );
        let enqueue = Error::EnqueueFailed {
            job_id: JobId::from("abc"),
            compensated: true,
            message: "broker down".into(),
        };
        assert_eq!(enqueue.category(), ErrorCategory::Infrastructure);
    }

    #[test]
    fn test_status_codes() {
        let resp = Error::invalid_input("file is required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Error::PayloadTooLarge("over 16 bytes".into()).into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let resp = Error::JobNotFound("abc".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = Error::EnqueueFailed {
            job_id: JobId::from("abc"),
            compensated: false,
            message: "timeout".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
