//! The `IssueTracker` trait.

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::types::{Issue, LabelInfo, ListParams};

/// Interface to an issue tracker.
///
/// Implementations are expected to be stateless from the pipeline's
/// perspective; the only mutation is `update_labels`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch a single issue. Returns `Ok(None)` when the issue does not exist.
    async fn get_issue(&self, number: u64) -> Result<Option<Issue>, TrackerError>;

    /// List issues matching the given parameters.
    async fn list_issues(&self, params: &ListParams) -> Result<Vec<Issue>, TrackerError>;

    /// List the repository's label catalog.
    async fn list_labels(&self) -> Result<Vec<LabelInfo>, TrackerError>;

    /// Replace the full label set of an issue.
    async fn update_labels(&self, number: u64, labels: &[String]) -> Result<(), TrackerError>;
}
