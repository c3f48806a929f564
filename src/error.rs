//! Error types for the eventscout crate

use thiserror::Error;

/// Result type for eventscout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for eventscout operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration or credentials are missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source page could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The extraction capability failed or returned unusable output
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Artifact storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A per-category job failed
    #[error("Job error: {0}")]
    Job(String),
}
