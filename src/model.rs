//! # LLM Client Module
//!
//! Builds the completion models used as the extraction capability, wrapped in
//! a client-side rate limiter so concurrent jobs share one request quota.
//!
//! ## Key Components
//!
//! - `LlmProvider`: which hosted model family to talk to
//! - `RateLimitedCompletionModel`: adds a per-minute quota to any completion model
//! - `mock_model::MockCompletionModel`: scripted model for tests
//!
//! Models are constructed once at startup and shared by reference between jobs.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use rig::{
    completion::CompletionModel,
    providers::{gemini, openai},
};
use serde::{Deserialize, Serialize};

pub mod mock_model;
pub mod ratelimited_completion;

pub use ratelimited_completion::RateLimitedCompletionModel;

/// Hosted model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl LlmProvider {
    /// Environment variable holding the provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

fn limited<M: CompletionModel>(
    model: M,
    requests_per_minute: NonZeroU32,
) -> RateLimitedCompletionModel<M> {
    RateLimitedCompletionModel::new(model, RateLimiter::direct(Quota::per_minute(requests_per_minute)))
}

/// OpenAI chat model, e.g. `gpt-3.5-turbo`
pub fn openai(
    api_key: &str,
    model_name: &str,
    requests_per_minute: NonZeroU32,
) -> RateLimitedCompletionModel<openai::CompletionModel> {
    let client = openai::Client::new(api_key);
    limited(client.completion_model(model_name), requests_per_minute)
}

/// Gemini model, e.g. `gemini-2.0-flash`
pub fn gemini(
    api_key: &str,
    model_name: &str,
    requests_per_minute: NonZeroU32,
) -> RateLimitedCompletionModel<gemini::completion::CompletionModel> {
    let client = gemini::Client::new(api_key);
    limited(client.completion_model(model_name), requests_per_minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_wrap_provider_models() {
        let rpm = NonZeroU32::new(10).unwrap();
        let _openai: RateLimitedCompletionModel<openai::CompletionModel> =
            super::openai("sk-test", "gpt-3.5-turbo", rpm);
        let _gemini: RateLimitedCompletionModel<gemini::completion::CompletionModel> =
            super::gemini("test-key", "gemini-2.0-flash", rpm);
    }

    #[test]
    fn test_provider_names() {
        let provider: LlmProvider = serde_yaml::from_str("gemini").unwrap();
        assert_eq!(provider, LlmProvider::Gemini);
        assert_eq!(provider.api_key_var(), "GEMINI_API_KEY");
        assert_eq!(LlmProvider::default().api_key_var(), "OPENAI_API_KEY");
    }
}
