//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. It returns a scripted text response or a provider error
//! without making any API call, and counts how many requests it received.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Error(String),
}

/// A mock completion model for testing purposes.
/// Clones share the script and the request counter.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    script: Arc<Mutex<Option<Scripted>>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    /// Creates a mock that answers with an empty text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with `text`.
    pub async fn set_text_response(&self, text: &str) {
        *self.script.lock().await = Some(Scripted::Text(text.to_string()));
    }

    /// Fail every request with a provider error.
    pub async fn set_error(&self, message: &str) {
        *self.script.lock().await = Some(Scripted::Error(message.to_string()));
    }

    /// Number of completion requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().await.clone();

        match script {
            Some(Scripted::Error(message)) => Err(CompletionError::ProviderError(message)),
            Some(Scripted::Text(text)) => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text(&text)),
                raw_response: text,
            }),
            None => Ok(CompletionResponse {
                choice: OneOrMany::one(AssistantContent::text("")),
                raw_response: String::new(),
            }),
        }
    }
}
