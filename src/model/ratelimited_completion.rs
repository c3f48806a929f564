use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::completion::{self, CompletionError, CompletionModel, CompletionRequest, CompletionResponse};
use tracing::{Instrument, debug_span, info_span};

use super::RateLimitResponse;

/// Completion model that waits for a quota slot before every request.
///
/// Clones share the same limiter.
#[derive(Clone)]
pub struct RateLimitedCompletionModel<M: CompletionModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedCompletionModel<M>
where
    M: CompletionModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }
}

impl<M: CompletionModel> CompletionModel for RateLimitedCompletionModel<M> {
    type Response = RateLimitResponse<M::Response>;

    async fn completion(
        &self,
        completion_request: CompletionRequest,
    ) -> Result<completion::CompletionResponse<Self::Response>, CompletionError> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("rate_limiter"))
            .await;
        let response = self
            .model
            .completion(completion_request)
            .instrument(info_span!("extraction_completion"))
            .await?;

        Ok(CompletionResponse {
            choice: response.choice,
            raw_response: RateLimitResponse {
                response: response.raw_response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock_model::MockCompletionModel;
    use governor::{Quota, RateLimiter};
    use rig::message::AssistantContent;
    use rig::completion::Completion as _;
    use std::num::NonZeroU32;

    #[tokio::test]
    async fn test_passes_response_through() {
        let mock = MockCompletionModel::new();
        mock.set_text_response("{\"Events\": []}").await;
        let limiter = RateLimiter::direct(Quota::per_minute(NonZeroU32::new(60).unwrap()));
        let model = RateLimitedCompletionModel::new(mock, limiter);

        let agent = rig::agent::AgentBuilder::new(model).build();
        let response = agent
            .completion("hola", Vec::new())
            .await
            .unwrap()
            .send()
            .await
            .unwrap();

        let texts: Vec<String> = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["{\"Events\": []}".to_string()]);
    }
}
