//! Pipeline error type.

use thiserror::Error;
use tracker::TrackerError;

/// Fatal pipeline errors.
///
/// Everything else (batch failures, malformed rows, per-subject stage errors
/// in multi-issue mode) is attenuated into logs or the subject's result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `current` mode was requested but no subject issue is bound to the run.
    #[error("no subject issue available: bind one with --issue or GITHUB_ISSUE_NUMBER")]
    MissingSubject,

    /// An issue range could not be parsed.
    #[error("invalid issue range: {0}")]
    InvalidRange(String),

    /// A tracker call that must return a sequence failed outright.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
