//! Issue-tracker client abstraction.
//!
//! This crate provides:
//! - Read-only issue snapshots (`Issue`) and label catalog entries (`LabelInfo`)
//! - The `IssueTracker` trait consumed by the dupscan pipeline
//! - A GitHub REST v3 implementation (`GitHubTracker`)

mod error;
mod github;
mod tracker;
mod types;

pub use error::TrackerError;
pub use github::GitHubTracker;
pub use tracker::IssueTracker;
pub use types::{Direction, Issue, IssueState, LabelInfo, ListParams, SortKey};
