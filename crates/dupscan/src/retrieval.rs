//! Candidate retrieval: per-label fetch, union, dedup, self-exclusion.

use std::collections::HashSet;

use tracing::debug;
use tracker::{Direction, Issue, IssueTracker, ListParams, SortKey, TrackerError};

use crate::config::ScanConfig;

/// Fetch candidate issues for the given effective labels.
///
/// One listing pass per label (or a single unfiltered pass when the label
/// sequence is empty), sorted by update time descending. The passes are
/// unioned in first-seen order, deduplicated by issue number, and the subject
/// itself is removed.
pub async fn retrieve(
    tracker: &dyn IssueTracker,
    effective_labels: &[String],
    exclude_number: u64,
    config: &ScanConfig,
) -> Result<Vec<Issue>, TrackerError> {
    let passes: Vec<Option<String>> = if effective_labels.is_empty() {
        vec![None]
    } else {
        effective_labels.iter().cloned().map(Some).collect()
    };

    let mut seen: HashSet<u64> = HashSet::new();
    let mut candidates: Vec<Issue> = Vec::new();

    for label in passes {
        let params = ListParams {
            state: config.state,
            sort: SortKey::Updated,
            direction: Direction::Desc,
            count: config.count,
            since: config.since,
            label,
        };
        for issue in tracker.list_issues(&params).await? {
            if issue.number == exclude_number || !seen.insert(issue.number) {
                continue;
            }
            candidates.push(issue);
        }
    }

    debug!(
        subject = exclude_number,
        candidates = candidates.len(),
        "Retrieved candidate issues"
    );
    Ok(candidates)
}
