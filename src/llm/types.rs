//! Completion request/response types, independent of any provider

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single completion request against the external service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Full prompt text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Provider response to one completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content of the response
    pub text: String,
    /// Time taken for the request
    pub elapsed: Duration,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            text: content.into(),
            elapsed,
        }
    }
}

/// A captured completion after the gateway's retry loop succeeded
///
/// Carries enough provenance for the run report: which model answered,
/// how long it took, and how many attempts it cost.
#[derive(Debug, Clone)]
pub struct RawCompletion {
    pub text: String,
    pub model: String,
    pub elapsed: Duration,
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_response_constructor() {
        let response = CompletionResponse::text("hello", Duration::from_millis(5));
        assert_eq!(response.text, "hello");
        assert_eq!(response.elapsed, Duration::from_millis(5));
    }
}
