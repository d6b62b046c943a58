//! Error types for the AI suggestion flows.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when asking the model for a suggestion.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key is configured.
    #[error("AI suggestions are not configured")]
    Disabled,

    /// The local per-minute request budget is used up.
    #[error("too many AI requests, try again in {} seconds", .0.as_secs().max(1))]
    LimitReached(Duration),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error body.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The reply was not the JSON we asked for.
    #[error("parse error: {0}")]
    Parse(String),

    /// The reply parsed but broke a rule of the requested shape.
    #[error("invalid suggestion: {0}")]
    Invalid(String),
}

impl AiError {
    /// Whether the failure is the caller's to retry later rather than a fault.
    #[must_use]
    pub const fn is_throttled(&self) -> bool {
        matches!(self, Self::LimitReached(_) | Self::RateLimited(_))
    }
}

/// API error response body.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_display() {
        let err = AiError::RateLimited(30);
        assert_eq!(err.to_string(), "rate limited, retry after 30 seconds");

        let err = AiError::LimitReached(Duration::from_millis(200));
        assert_eq!(err.to_string(), "too many AI requests, try again in 1 seconds");
        assert!(err.is_throttled());
        assert!(!AiError::Disabled.is_throttled());
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "overloaded_error",
                "message": "Overloaded"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error_type, "error");
        assert_eq!(response.error.error_type, "overloaded_error");
        assert_eq!(response.error.message, "Overloaded");
    }
}
