//! Error type for tracker operations.

use thiserror::Error;

/// Errors surfaced by issue-tracker implementations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker API returned a non-success status.
    #[error("tracker API error: {status} - {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// A response body could not be decoded into the expected shape.
    #[error("failed to parse tracker response: {0}")]
    Parse(String),
}
