//! Error type for oracle operations.

use thiserror::Error;

/// Errors surfaced by oracle implementations.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Transport-level failure.
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The oracle API returned an error response.
    #[error("oracle API error ({kind}): {message}")]
    Api { kind: String, message: String },

    /// The oracle returned no usable text.
    #[error("oracle returned an empty response")]
    Empty,

    /// No API key available for the provider.
    #[error("missing API key: set {0}")]
    MissingApiKey(&'static str),
}
