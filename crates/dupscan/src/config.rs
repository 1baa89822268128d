//! Scan configuration.

use chrono::{DateTime, Utc};
use tracker::IssueState;

/// Total flexible token budget shared by all candidates in one batch request.
pub const FLEX_TOKEN_BUDGET: u32 = 7000;

/// Bounds for the per-candidate token budget.
pub const MIN_TOKENS_PER_ISSUE: u32 = 100;
pub const MAX_TOKENS_PER_ISSUE: u32 = 5000;

/// Label filter applied to candidate retrieval.
///
/// An explicit variant instead of overloading an "auto" string sentinel: the
/// three cases behave differently downstream and should not be guessed from
/// an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelFilter {
    /// Fetch candidates without any label filter.
    Unfiltered,
    /// Use exactly these labels, one retrieval pass per label.
    Explicit(Vec<String>),
    /// Ask the oracle to rank applicable labels for each subject.
    #[default]
    Auto,
}

impl std::str::FromStr for LabelFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::Unfiltered);
        }
        let labels: Vec<String> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect();
        if labels.is_empty() {
            Ok(Self::Unfiltered)
        } else {
            Ok(Self::Explicit(labels))
        }
    }
}

/// Configuration for one scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Candidates fetched per label pass.
    pub count: u32,
    /// Only consider candidates updated at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub labels: LabelFilter,
    /// Candidate issue state filter.
    pub state: IssueState,
    /// Early-exit quota: stop batching once this many duplicates are accepted.
    pub max_duplicates: usize,
    /// Per-candidate token budget, clamped to [100, 5000] when used.
    pub tokens_per_issue: u32,
    /// Re-check each first-stage duplicate with the large model.
    pub confirm_duplicates: bool,
    /// Apply the `duplicate` label to subjects with confirmed findings.
    pub label_as_duplicate: bool,
    /// Cap for `all`-range resolution.
    pub max_issues: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            count: 30,
            since: None,
            labels: LabelFilter::Auto,
            state: IssueState::All,
            max_duplicates: 3,
            tokens_per_issue: 1000,
            confirm_duplicates: true,
            label_as_duplicate: false,
            max_issues: 50,
        }
    }
}

impl ScanConfig {
    /// Effective per-candidate token budget.
    #[must_use]
    pub fn tokens_per_issue_clamped(&self) -> u32 {
        self.tokens_per_issue
            .clamp(MIN_TOKENS_PER_ISSUE, MAX_TOKENS_PER_ISSUE)
    }

    /// Number of candidates per oracle batch: `ceil(budget / per-issue)`.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        FLEX_TOKEN_BUDGET.div_ceil(self.tokens_per_issue_clamped()) as usize
    }

    /// Token cap for the subject excerpt in batch prompts.
    #[must_use]
    pub fn subject_token_cap(&self) -> u32 {
        2 * self.tokens_per_issue_clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_filter_parsing() {
        assert_eq!("auto".parse::<LabelFilter>().unwrap(), LabelFilter::Auto);
        assert_eq!("AUTO".parse::<LabelFilter>().unwrap(), LabelFilter::Auto);
        assert_eq!("".parse::<LabelFilter>().unwrap(), LabelFilter::Unfiltered);
        assert_eq!(
            "none".parse::<LabelFilter>().unwrap(),
            LabelFilter::Unfiltered
        );
        assert_eq!(
            "bug, ui ,".parse::<LabelFilter>().unwrap(),
            LabelFilter::Explicit(vec!["bug".to_string(), "ui".to_string()])
        );
        assert_eq!(" , ".parse::<LabelFilter>().unwrap(), LabelFilter::Unfiltered);
    }

    #[test]
    fn test_batch_size_default() {
        // 7000 / 1000 = 7 candidates per batch
        assert_eq!(ScanConfig::default().batch_size(), 7);
    }

    #[test]
    fn test_batch_size_rounds_up() {
        let config = ScanConfig {
            tokens_per_issue: 3000,
            ..ScanConfig::default()
        };
        // ceil(7000 / 3000) = 3
        assert_eq!(config.batch_size(), 3);
    }

    #[test]
    fn test_tokens_per_issue_clamped() {
        let low = ScanConfig {
            tokens_per_issue: 10,
            ..ScanConfig::default()
        };
        assert_eq!(low.tokens_per_issue_clamped(), MIN_TOKENS_PER_ISSUE);
        assert_eq!(low.batch_size(), 70);

        let high = ScanConfig {
            tokens_per_issue: 90_000,
            ..ScanConfig::default()
        };
        assert_eq!(high.tokens_per_issue_clamped(), MAX_TOKENS_PER_ISSUE);
        assert_eq!(high.batch_size(), 2);
        assert_eq!(high.subject_token_cap(), 10_000);
    }
}
