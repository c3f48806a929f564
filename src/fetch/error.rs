//! Error types for the fetch module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Transport failure reaching a source page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body read failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source (or proxy) answered with a non-success status
    #[error("unexpected status {status} fetching {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested page
        url: String,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<FetchError> for CrateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http(e) => CrateError::Http(e),
            _ => CrateError::Fetch(err.to_string()),
        }
    }
}
