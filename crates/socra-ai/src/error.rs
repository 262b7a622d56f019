//! Error types for socra-ai

use std::time::Duration;

use thiserror::Error;

/// Result type alias using socra-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a response
#[derive(Error, Debug)]
pub enum Error {
    /// No credential configured; detected before any network call
    #[error("missing credential: {env_var} is not set")]
    MissingCredential { env_var: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The inference service returned an error payload
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Credential rejected by the service
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// No segment arrived within the idle timeout
    #[error("no data received for {0:?}")]
    Timeout(Duration),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if a later attempt could plausibly succeed.
    ///
    /// Only used for diagnostics; every failure is surfaced the same way.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_)
            | Error::RateLimited { .. }
            | Error::Sse(_)
            | Error::Timeout(_) => true,
            Error::Api {
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                et.contains("overloaded")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("currently loading")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }
}
