//! Range resolution: which issues a run examines.

use tracing::{debug, trace};
use tracker::{Direction, Issue, IssueState, IssueTracker, ListParams, SortKey};

use crate::error::PipelineError;

/// Which subject issues to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// The issue bound to the run context.
    Current,
    /// The most recently created issues, capped at `max`.
    All { max: usize },
    /// An inclusive number range.
    Bounded { start: u64, end: u64 },
    /// One specific issue.
    Single(u64),
}

impl RangeSpec {
    /// Parse a range specification: `current`, `all`, `N-M`, or `N`.
    ///
    /// `max_issues` caps the `all` variant.
    pub fn parse(spec: &str, max_issues: usize) -> Result<Self, PipelineError> {
        let trimmed = spec.trim();
        if trimmed.eq_ignore_ascii_case("current") {
            return Ok(Self::Current);
        }
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All { max: max_issues });
        }
        if let Some((start, end)) = trimmed.split_once('-') {
            let start = parse_number(start, spec)?;
            let end = parse_number(end, spec)?;
            return Self::bounded(start, end);
        }
        Ok(Self::Single(parse_number(trimmed, spec)?))
    }

    /// Construct a bounded range, enforcing `start <= end`.
    pub fn bounded(start: u64, end: u64) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidRange(format!(
                "start {start} is greater than end {end}"
            )));
        }
        Ok(Self::Bounded { start, end })
    }
}

fn parse_number(text: &str, spec: &str) -> Result<u64, PipelineError> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| PipelineError::InvalidRange(format!("not an issue number: {spec}")))
}

/// Resolve a range spec into a concrete ordered list of subject issues.
///
/// Output order matches fetch order; nothing is resorted. A missing issue in
/// a bounded range is skipped with a trace note; a missing `Single` target
/// yields an empty list. Only `Current` without a bound context issue is
/// fatal.
pub async fn resolve(
    tracker: &dyn IssueTracker,
    spec: &RangeSpec,
    context: Option<&Issue>,
    state: IssueState,
) -> Result<Vec<Issue>, PipelineError> {
    match spec {
        RangeSpec::Current => context
            .map(|issue| vec![issue.clone()])
            .ok_or(PipelineError::MissingSubject),

        RangeSpec::All { max } => {
            let params = ListParams {
                state,
                sort: SortKey::Created,
                direction: Direction::Desc,
                count: *max as u32,
                since: None,
                label: None,
            };
            let mut issues = tracker.list_issues(&params).await?;
            issues.truncate(*max);
            debug!(count = issues.len(), "Resolved issue range (all)");
            Ok(issues)
        }

        RangeSpec::Bounded { start, end } => {
            let mut issues = Vec::new();
            for number in *start..=*end {
                match tracker.get_issue(number).await? {
                    Some(issue) => issues.push(issue),
                    None => trace!(number, "Issue missing in range, skipping"),
                }
            }
            debug!(start, end, count = issues.len(), "Resolved issue range");
            Ok(issues)
        }

        RangeSpec::Single(number) => {
            Ok(tracker.get_issue(*number).await?.into_iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(RangeSpec::parse("current", 50).unwrap(), RangeSpec::Current);
        assert_eq!(
            RangeSpec::parse("ALL", 25).unwrap(),
            RangeSpec::All { max: 25 }
        );
    }

    #[test]
    fn test_parse_single_and_bounded() {
        assert_eq!(RangeSpec::parse("17", 50).unwrap(), RangeSpec::Single(17));
        assert_eq!(
            RangeSpec::parse("5-9", 50).unwrap(),
            RangeSpec::Bounded { start: 5, end: 9 }
        );
        assert_eq!(
            RangeSpec::parse("5-5", 50).unwrap(),
            RangeSpec::Bounded { start: 5, end: 5 }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            RangeSpec::parse("abc", 50),
            Err(PipelineError::InvalidRange(_))
        ));
        assert!(matches!(
            RangeSpec::parse("1-x", 50),
            Err(PipelineError::InvalidRange(_))
        ));
        assert!(matches!(
            RangeSpec::parse("9-5", 50),
            Err(PipelineError::InvalidRange(_))
        ));
    }
}
