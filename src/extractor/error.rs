//! Error types for the extractor module

use crate::error::Error as CrateError;
use rig::completion::CompletionError;
use thiserror::Error;

/// Failure to turn a fragment into validated events
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extraction capability could not be reached or refused the request
    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),

    /// The model answered with no text
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The model output is not the expected JSON shape
    #[error("malformed model output: {0}")]
    Parse(String),

    /// A record violates the event schema
    #[error("event {index}: invalid '{field}': {reason}")]
    Validation {
        /// Position of the record in the model output
        index: usize,
        /// Offending field
        field: String,
        /// What was wrong with it
        reason: String,
    },
}

impl ExtractionError {
    /// Whether the model answered but its output could not be trusted
    pub fn is_output_error(&self) -> bool {
        !matches!(self, ExtractionError::Completion(_))
    }
}

impl From<ExtractionError> for CrateError {
    fn from(err: ExtractionError) -> Self {
        CrateError::Extraction(err.to_string())
    }
}
