use super::error::CompletionError;
use super::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;

/// Abstraction over the completion service so production (genai) and test
/// (mock) backends are interchangeable.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;

    fn name(&self) -> &str;

    fn model_info(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct TestClient;

    #[async_trait]
    impl CompletionClient for TestClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            Ok(CompletionResponse::text(
                "test response",
                Duration::from_millis(10),
            ))
        }

        fn name(&self) -> &str {
            "TestClient"
        }
    }

    #[tokio::test]
    async fn test_client_trait() {
        let client = TestClient;
        assert_eq!(client.name(), "TestClient");
        assert!(client.model_info().is_none());
        let response = client
            .complete(CompletionRequest {
                prompt: "hi".into(),
                temperature: 0.2,
                max_tokens: 16,
            })
            .await
            .unwrap();
        assert_eq!(response.text, "test response");
    }
}
