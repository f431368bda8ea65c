// File: ./src/client/error.rs
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("No API URL configured")]
    NotConfigured,
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
    #[error("Could not build request: {0}")]
    Request(String),
    #[error("Connection failed: {0}")]
    Transport(String),
    #[error("Not authorized, please log in again")]
    Unauthorized { body: String },
    #[error("Server answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Picks the `detail` message DRF puts in error bodies, falling back to the error text.
    pub fn user_message(&self) -> String {
        if let ApiError::Status { body, .. } | ApiError::Unauthorized { body } = self
            && let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
            && let Some(detail) = value.get("detail").and_then(|d| d.as_str())
        {
            return detail.to_string();
        }
        self.to_string()
    }
}
