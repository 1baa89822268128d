//! Findings, per-issue results, label mutation, and report aggregation.

use std::fmt::Write as _;

use tracing::info;
use tracker::{Issue, IssueTracker, TrackerError};

/// The label applied to subjects with confirmed duplicates.
pub const DUPLICATE_LABEL: &str = "duplicate";

/// One accepted duplicate candidate for a subject issue.
#[derive(Debug, Clone)]
pub struct DuplicateFinding {
    pub candidate: Issue,
    /// `#<number>: <oracle reasoning>`, annotated (never overwritten) when
    /// confirmation rejects the candidate.
    pub reasoning: String,
    /// Whether the finding survived the confirmation stage (always true when
    /// confirmation is disabled).
    pub confirmed: bool,
}

/// Result of scanning one subject issue.
///
/// Created once at the start of the subject's pipeline run, mutated only by
/// that run's stages, then aggregated into the [`Report`].
#[derive(Debug, Clone)]
pub struct IssueResult {
    pub subject: Issue,
    /// The subject already carried the duplicate label when the run started.
    pub was_marked_duplicate: bool,
    /// All first-stage findings, confirmed or not, in acceptance order.
    pub findings: Vec<DuplicateFinding>,
    pub errors: Option<String>,
}

impl IssueResult {
    #[must_use]
    pub fn new(subject: Issue) -> Self {
        let was_marked_duplicate = subject.has_label(DUPLICATE_LABEL);
        Self {
            subject,
            was_marked_duplicate,
            findings: Vec::new(),
            errors: None,
        }
    }

    /// Number of findings that survived confirmation.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        self.findings.iter().filter(|f| f.confirmed).count()
    }

    /// Record a stage error without discarding earlier ones.
    pub fn record_error(&mut self, message: &str) {
        match &mut self.errors {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(message);
            }
            None => self.errors = Some(message.to_string()),
        }
    }

    fn outcome(&self) -> &'static str {
        match (self.was_marked_duplicate, self.confirmed_count() > 0) {
            (false, true) => "newly detected duplicate",
            (true, false) => "false positive candidate (marked but no duplicates found)",
            (true, true) => "confirmed duplicate",
            (false, false) => "clean",
        }
    }
}

/// Apply the duplicate label to a subject with confirmed findings.
///
/// Idempotent: guarded by the already-marked check, and the label-set union
/// makes a repeated call with the same findings a no-op.
pub async fn apply_duplicate_label(
    tracker: &dyn IssueTracker,
    result: &IssueResult,
) -> Result<bool, TrackerError> {
    if result.was_marked_duplicate || result.confirmed_count() == 0 {
        return Ok(false);
    }

    let mut labels = result.subject.labels.clone();
    if !result.subject.has_label(DUPLICATE_LABEL) {
        labels.push(DUPLICATE_LABEL.to_string());
    }
    tracker.update_labels(result.subject.number, &labels).await?;
    info!(subject = result.subject.number, "Applied duplicate label");
    Ok(true)
}

/// Aggregate of all per-issue results plus summary counters.
#[derive(Debug, Default)]
pub struct Report {
    results: Vec<IssueResult>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: IssueResult) {
        self.results.push(result);
    }

    #[must_use]
    pub fn results(&self) -> &[IssueResult] {
        &self.results
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Subjects that already carried the duplicate label.
    #[must_use]
    pub fn already_marked(&self) -> usize {
        self.results.iter().filter(|r| r.was_marked_duplicate).count()
    }

    /// Subjects with confirmed findings that were not previously marked.
    #[must_use]
    pub fn newly_found(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.was_marked_duplicate && r.confirmed_count() > 0)
            .count()
    }

    /// Subjects marked duplicate where the scan found nothing.
    #[must_use]
    pub fn false_positives(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.was_marked_duplicate && r.confirmed_count() == 0)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.errors.is_some()).count()
    }

    /// Emit the report through a sink.
    pub fn render(&self, sink: &mut dyn ReportSink) {
        sink.heading(1, "Duplicate scan report");

        sink.heading(2, "Summary");
        sink.list_item(&format!("Issues scanned: {}", self.total()));
        sink.list_item(&format!("Already marked duplicate: {}", self.already_marked()));
        sink.list_item(&format!("Newly found duplicates: {}", self.newly_found()));
        sink.list_item(&format!(
            "Possible false positives: {}",
            self.false_positives()
        ));
        sink.list_item(&format!("Errors: {}", self.error_count()));

        for result in &self.results {
            sink.heading(
                2,
                &format!("#{} {}", result.subject.number, result.subject.title),
            );
            sink.paragraph(&format!("Outcome: {}", result.outcome()));

            for finding in &result.findings {
                if finding.confirmed {
                    sink.list_item(&format!(
                        "[{}]({}): {}",
                        finding.candidate.title, finding.candidate.url, finding.reasoning
                    ));
                } else {
                    sink.list_item(&format!("rejected: {}", finding.reasoning));
                }
            }

            if let Some(errors) = &result.errors {
                sink.paragraph(&format!("Errors: {errors}"));
            }
        }
    }
}

/// Write-only report sink: headings, paragraphs, list items.
pub trait ReportSink {
    fn heading(&mut self, level: u8, text: &str);
    fn paragraph(&mut self, text: &str);
    fn list_item(&mut self, text: &str);
}

/// Markdown-rendering report sink.
#[derive(Debug, Default)]
pub struct MarkdownReport {
    buffer: String,
}

impl MarkdownReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl ReportSink for MarkdownReport {
    fn heading(&mut self, level: u8, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        let hashes = "#".repeat(usize::from(level.clamp(1, 6)));
        let _ = writeln!(self.buffer, "{hashes} {text}\n");
    }

    fn paragraph(&mut self, text: &str) {
        let _ = writeln!(self.buffer, "{text}\n");
    }

    fn list_item(&mut self, text: &str) {
        let _ = writeln!(self.buffer, "- {text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issue(number: u64, labels: &[&str]) -> Issue {
        Issue {
            number,
            title: format!("issue {number}"),
            body: String::new(),
            labels: labels.iter().map(|s| (*s).to_string()).collect(),
            url: format!("https://example.com/{number}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn finding(number: u64, confirmed: bool) -> DuplicateFinding {
        DuplicateFinding {
            candidate: issue(number, &[]),
            reasoning: format!("#{number}: close match"),
            confirmed,
        }
    }

    #[test]
    fn test_outcome_buckets() {
        let mut clean = IssueResult::new(issue(1, &[]));
        assert_eq!(clean.outcome(), "clean");
        clean.findings.push(finding(2, true));
        assert_eq!(clean.outcome(), "newly detected duplicate");

        let mut marked = IssueResult::new(issue(3, &["duplicate"]));
        assert!(marked.was_marked_duplicate);
        assert_eq!(
            marked.outcome(),
            "false positive candidate (marked but no duplicates found)"
        );
        marked.findings.push(finding(4, true));
        assert_eq!(marked.outcome(), "confirmed duplicate");
    }

    #[test]
    fn test_unconfirmed_findings_do_not_count() {
        let mut result = IssueResult::new(issue(1, &[]));
        result.findings.push(finding(2, false));
        assert_eq!(result.confirmed_count(), 0);
        assert_eq!(result.outcome(), "clean");
    }

    #[test]
    fn test_record_error_appends() {
        let mut result = IssueResult::new(issue(1, &[]));
        result.record_error("first");
        result.record_error("second");
        assert_eq!(result.errors.as_deref(), Some("first; second"));
    }

    #[test]
    fn test_report_counters() {
        let mut report = Report::new();

        let mut newly = IssueResult::new(issue(1, &[]));
        newly.findings.push(finding(10, true));
        report.push(newly);

        report.push(IssueResult::new(issue(2, &["duplicate"])));

        let mut errored = IssueResult::new(issue(3, &[]));
        errored.record_error("boom");
        report.push(errored);

        assert_eq!(report.total(), 3);
        assert_eq!(report.newly_found(), 1);
        assert_eq!(report.already_marked(), 1);
        assert_eq!(report.false_positives(), 1);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_markdown_rendering() {
        let mut report = Report::new();
        let mut result = IssueResult::new(issue(5, &[]));
        result.findings.push(finding(42, true));
        result.findings.push(DuplicateFinding {
            candidate: issue(43, &[]),
            reasoning: "#43: weak match (not confirmed by large model: UNI)".to_string(),
            confirmed: false,
        });
        report.push(result);

        let mut sink = MarkdownReport::new();
        report.render(&mut sink);
        let md = sink.into_string();

        assert!(md.starts_with("# Duplicate scan report"));
        assert!(md.contains("## #5 issue 5"));
        assert!(md.contains("- [issue 42](https://example.com/42)"));
        assert!(md.contains("- rejected: #43: weak match"));
        assert!(md.contains("Issues scanned: 1"));
    }
}
