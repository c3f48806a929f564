//! Error types for the pipeline module

use crate::error::Error as CrateError;
use crate::extractor::ExtractionError;
use crate::fetch::FetchError;
use crate::storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Terminal failure of one category's job
#[derive(Debug, Error)]
pub enum JobError {
    /// The source page could not be retrieved
    #[error(transparent)]
    Transport(#[from] FetchError),

    /// The page no longer contains the category's anchor
    #[error("anchor #{anchor_id} not found in page")]
    FragmentNotFound { anchor_id: String },

    /// The model could not be reached or its output was rejected
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The category artifact could not be written
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The job's task panicked or was cancelled
    #[error("task failed: {0}")]
    Task(String),
}

impl JobError {
    pub fn kind(&self) -> FailureKind {
        match self {
            JobError::Transport(_) => FailureKind::Fetch,
            JobError::FragmentNotFound { .. } => FailureKind::FragmentNotFound,
            JobError::Extraction(e) if e.is_output_error() => FailureKind::Parse,
            JobError::Extraction(_) => FailureKind::Extract,
            JobError::Storage(_) => FailureKind::Write,
            JobError::Task(_) => FailureKind::Task,
        }
    }
}

impl From<JobError> for CrateError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Transport(e) => e.into(),
            JobError::Extraction(e) => e.into(),
            JobError::Storage(e) => e.into(),
            _ => CrateError::Job(err.to_string()),
        }
    }
}

/// Stable tag reported for a failed category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Fetch,
    FragmentNotFound,
    Parse,
    Extract,
    Write,
    Task,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Fetch => "fetch_error",
            FailureKind::FragmentNotFound => "fragment_not_found",
            FailureKind::Parse => "parse_error",
            FailureKind::Extract => "extract_error",
            FailureKind::Write => "write_error",
            FailureKind::Task => "task_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let err = JobError::from(FetchError::Status {
            status: 503,
            url: "https://cosmocaixa.org/es/planetario".to_string(),
        });
        assert_eq!(err.kind().as_str(), "fetch_error");

        let err = JobError::FragmentNotFound {
            anchor_id: "portlet".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::FragmentNotFound);
        assert_eq!(err.to_string(), "anchor #portlet not found in page");

        let err = JobError::from(ExtractionError::Parse("not json".to_string()));
        assert_eq!(err.kind().as_str(), "parse_error");

        let err = JobError::from(ExtractionError::EmptyResponse);
        assert_eq!(err.kind(), FailureKind::Parse);

        let err = JobError::from(ExtractionError::Completion(
            rig::completion::CompletionError::ProviderError("rate limited".to_string()),
        ));
        assert_eq!(err.kind().to_string(), "extract_error");

        assert_eq!(JobError::Task("panicked".to_string()).kind().as_str(), "task_error");
    }
}
