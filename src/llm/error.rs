//! Completion error taxonomy

use thiserror::Error;

/// Errors a completion client can produce on a single call
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// API request failed with the given message
    #[error("API error{}: {}", .status_code.map(|c| format!(" ({c})")).unwrap_or_default(), .message)]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Transport-level failure (connection refused, DNS, ...)
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with something the client could not decode
    #[error("malformed response from provider: {0}")]
    MalformedResponse(String),

    /// Missing API keys, invalid settings, exhausted mock scripts
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CompletionError {
    /// Whether the gateway should retry after this error
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CompletionError::Configuration(_))
    }
}

/// Terminal gateway failure after the bounded retry loop was exhausted.
/// Fatal for the affected target only, never for the whole run.
#[derive(Debug, Clone, Error)]
#[error("completion service unavailable after {attempts} attempt(s): {last_error}")]
pub struct CompletionUnavailableError {
    pub attempts: u32,
    pub last_error: CompletionError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CompletionError::Timeout { seconds: 30 }.is_retryable());
        assert!(CompletionError::Network("refused".into()).is_retryable());
        assert!(!CompletionError::Configuration("no key".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_status_code() {
        let err = CompletionError::Api {
            message: "boom".into(),
            status_code: Some(503),
        };
        assert!(err.to_string().contains("503"));
    }
}
