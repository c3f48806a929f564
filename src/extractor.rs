//! # Schema-Constrained Extraction
//!
//! Turns an HTML fragment into validated [`Event`] records by asking a
//! language model to fill a fixed schema and then checking everything it
//! returns.
//!
//! ## Flow
//!
//! 1. The fragment is embedded in the prompt template together with format
//!    instructions generated from the event JSON Schema.
//! 2. The request goes to a rig [`CompletionModel`] through an agent carrying
//!    the extraction preamble and the configured temperature.
//! 3. The answer is unwrapped, parsed and validated record by record; dates are
//!    coerced to timestamps and prices normalized.
//!
//! A failure to reach the model surfaces as [`ExtractionError::Completion`];
//! anything wrong with what the model said is a parse or validation error.

mod config;
mod error;
mod prompt;
mod schema;
pub mod validation;

pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use error::ExtractionError;
pub use prompt::PromptTemplate;
pub use schema::EventSchema;

use rig::{
    agent::{Agent, AgentBuilder},
    completion::{Completion as _, CompletionModel},
    message::AssistantContent,
};
use tracing::{debug, instrument, trace, warn};

use crate::event::Event;
use crate::fragment::Fragment;

const PREAMBLE: &str = "You extract structured event listings from HTML. \
Answer only with JSON that follows the requested schema.";

/// Extracts events from fragments with a completion model
pub struct SchemaExtractor<C>
where
    C: CompletionModel,
{
    agent: Agent<C>,
    schema: EventSchema,
    template: PromptTemplate,
}

impl<C> SchemaExtractor<C>
where
    C: CompletionModel,
{
    pub fn new(model: C, config: ExtractorConfig) -> Self {
        let agent = AgentBuilder::new(model)
            .preamble(PREAMBLE)
            .temperature(config.temperature)
            .build();

        Self {
            agent,
            schema: EventSchema::new(),
            template: config.template,
        }
    }

    pub fn schema(&self) -> &EventSchema {
        &self.schema
    }

    /// The full request text sent for `fragment`
    pub fn build_request(&self, fragment: &Fragment) -> String {
        self.template
            .render(&self.schema.format_instructions(), fragment.as_str())
    }

    /// Extract every event listed in `fragment`.
    ///
    /// A fragment without events yields an empty list.
    #[instrument(skip_all, fields(anchor = %fragment.anchor_id))]
    pub async fn extract(&self, fragment: &Fragment) -> Result<Vec<Event>, ExtractionError> {
        let prompt = self.build_request(fragment);
        debug!("Requesting extraction ({} prompt bytes)", prompt.len());

        let response = self.agent.completion(prompt, Vec::new()).await?.send().await?;

        let text = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<String>();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyResponse);
        }
        trace!(response = %text, "Model response");

        let events = validation::parse_response(&text)?;
        for event in events.iter().filter(|e| !e.has_ordered_dates()) {
            warn!("Event '{}' ends before it starts", event.name);
        }

        debug!("Extracted {} events", events.len());
        Ok(events)
    }
}
