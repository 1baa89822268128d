//! Issue and query types shared by tracker implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A read-only snapshot of a tracker issue.
///
/// Fetched per run; the pipeline never mutates a snapshot in place, label
/// changes go through [`crate::IssueTracker::update_labels`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Stable, unique issue number.
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Label names currently attached to the issue.
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Check whether a label is attached, case-insensitively.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(name))
    }
}

/// A label catalog entry (name plus optional description).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Issue state filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IssueState {
    Open,
    Closed,
    #[default]
    All,
}

impl IssueState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "all" => Ok(Self::All),
            other => Err(format!("invalid issue state: {other}")),
        }
    }
}

/// Sort key for issue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    Created,
    #[default]
    Updated,
}

impl SortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Sort direction for issue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters for [`crate::IssueTracker::list_issues`].
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub state: IssueState,
    pub sort: SortKey,
    pub direction: Direction,
    /// Maximum number of issues to return.
    pub count: u32,
    /// Only issues updated at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Restrict to issues carrying this label.
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(labels: &[&str]) -> Issue {
        Issue {
            number: 1,
            title: "t".to_string(),
            body: String::new(),
            labels: labels.iter().map(|s| (*s).to_string()).collect(),
            url: "https://example.com/1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_label_case_insensitive() {
        let i = issue(&["Bug", "duplicate"]);
        assert!(i.has_label("bug"));
        assert!(i.has_label("Duplicate"));
        assert!(!i.has_label("wontfix"));
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!("open".parse::<IssueState>().unwrap(), IssueState::Open);
        assert_eq!("ALL".parse::<IssueState>().unwrap(), IssueState::All);
        assert!("ajar".parse::<IssueState>().is_err());
    }
}
