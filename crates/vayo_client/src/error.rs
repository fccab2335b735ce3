//! Client-side error type for API calls and local validation.
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by [`crate::ApiClient`] and the optimistic layer.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in")]
    Unauthorized,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Classify a non-success response.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = error_message_for_response(status, body);
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation(message)
            }
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Human-readable message from an error body: the `error` field of a JSON
/// body, the raw body, or the status reason when the body is empty.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}
