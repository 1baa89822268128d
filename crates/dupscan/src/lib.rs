//! # dupscan
//!
//! Detects whether issue reports are near-duplicates of other reports in the
//! same tracker, using a text-classification oracle, and optionally applies a
//! `duplicate` label.
//!
//! The pipeline per subject issue: range resolution, label inference,
//! candidate retrieval and dedup, token-budgeted batch classification,
//! confirmation, label mutation, and report aggregation.

pub mod classify;
pub mod config;
pub mod confirm;
mod error;
pub mod labels;
pub mod pipeline;
pub mod prompts;
pub mod range;
pub mod report;
pub mod retrieval;
pub mod tokens;

pub use config::{LabelFilter, ScanConfig};
pub use error::PipelineError;
pub use pipeline::DupscanPipeline;
pub use range::RangeSpec;
pub use report::{DuplicateFinding, IssueResult, MarkdownReport, Report, ReportSink};
