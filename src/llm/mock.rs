//! Scripted completion client for tests

use super::client::CompletionClient;
use super::error::CompletionError;
use super::types::{CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted exchange: either a canned text or a canned error
#[derive(Debug, Clone)]
pub struct MockCompletion {
    pub text: String,
    pub error: Option<CompletionError>,
}

impl MockCompletion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            error: None,
        }
    }

    pub fn error(error: CompletionError) -> Self {
        Self {
            text: String::new(),
            error: Some(error),
        }
    }
}

/// Queue-backed mock; responses are consumed in FIFO order and every call
/// is counted so tests can assert how many completions were issued.
pub struct MockCompletionClient {
    responses: Mutex<VecDeque<MockCompletion>>,
    calls: AtomicUsize,
    name: String,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            name: "MockCompletion".to_string(),
        }
    }

    pub fn add_response(&self, response: MockCompletion) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockCompletion>) {
        let mut queue = self.responses.lock().unwrap();
        for response in responses {
            queue.push_back(response);
        }
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Number of `complete` calls issued so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockCompletion {
                error: Some(error), ..
            }) => Err(error),
            Some(MockCompletion { text, .. }) => {
                Ok(CompletionResponse::text(text, Duration::from_millis(1)))
            }
            None => Err(CompletionError::Configuration(
                "mock response queue exhausted".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
