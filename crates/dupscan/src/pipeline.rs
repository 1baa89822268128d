//! Pipeline orchestration.

use std::sync::Arc;

use anyhow::Result;
use oracle::Oracle;
use tracing::{info, warn};
use tracker::{Issue, IssueTracker};

use crate::classify::BatchClassifier;
use crate::config::{LabelFilter, ScanConfig};
use crate::error::PipelineError;
use crate::prompts::PromptManager;
use crate::range::{self, RangeSpec};
use crate::report::{apply_duplicate_label, IssueResult, Report};
use crate::{confirm, labels, retrieval};

/// Duplicate-detection pipeline orchestrator.
///
/// Processing is strictly sequential at all three nesting levels: subject
/// issues, batches within a subject, confirmation calls within a batch.
pub struct DupscanPipeline {
    tracker: Arc<dyn IssueTracker>,
    oracle: Arc<dyn Oracle>,
    config: ScanConfig,
    prompts: PromptManager,
}

impl DupscanPipeline {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        oracle: Arc<dyn Oracle>,
        config: ScanConfig,
    ) -> Result<Self> {
        let prompts = PromptManager::new()?;
        Ok(Self {
            tracker,
            oracle,
            config,
            prompts,
        })
    }

    /// Run the pipeline over a resolved range of subject issues.
    ///
    /// Only range resolution can fail here; per-subject errors are captured
    /// into that subject's result and never abort sibling subjects.
    pub async fn run(
        &self,
        spec: &RangeSpec,
        context: Option<&Issue>,
    ) -> Result<Report, PipelineError> {
        let subjects =
            range::resolve(self.tracker.as_ref(), spec, context, self.config.state).await?;
        info!(subjects = subjects.len(), "Resolved subject issues");

        let mut report = Report::new();
        for subject in subjects {
            report.push(self.process_subject(&subject).await);
        }
        Ok(report)
    }

    /// Run every stage for one subject, attenuating errors into its result.
    async fn process_subject(&self, subject: &Issue) -> IssueResult {
        let mut result = IssueResult::new(subject.clone());
        info!(
            subject = subject.number,
            already_marked = result.was_marked_duplicate,
            "Scanning issue for duplicates"
        );

        if let Err(e) = self.scan_subject(subject, &mut result).await {
            warn!(subject = subject.number, error = %e, "Scan failed for subject");
            result.record_error(&format!("{e:#}"));
        }

        if self.config.label_as_duplicate {
            if let Err(e) = apply_duplicate_label(self.tracker.as_ref(), &result).await {
                warn!(subject = subject.number, error = %e, "Label update failed");
                result.record_error(&format!("label update failed: {e}"));
            }
        }

        result
    }

    /// Label inference, retrieval, batch classification, confirmation.
    async fn scan_subject(&self, subject: &Issue, result: &mut IssueResult) -> Result<()> {
        let effective_labels = self.effective_labels(subject).await?;

        let candidates = retrieval::retrieve(
            self.tracker.as_ref(),
            &effective_labels,
            subject.number,
            &self.config,
        )
        .await?;

        let classifier = BatchClassifier::new(self.oracle.as_ref(), &self.prompts, &self.config);

        for batch in candidates.chunks(self.config.batch_size()) {
            let findings = classifier.classify_batch(subject, batch).await;

            for mut finding in findings {
                if self.config.confirm_duplicates {
                    confirm::confirm_finding(
                        self.oracle.as_ref(),
                        &self.prompts,
                        subject,
                        &mut finding,
                    )
                    .await;
                } else {
                    finding.confirmed = true;
                }
                result.findings.push(finding);
            }

            // Quota counts confirmed duplicates; remaining candidates are
            // never sent to the oracle once it is reached.
            if result.confirmed_count() >= self.config.max_duplicates {
                info!(
                    subject = subject.number,
                    quota = self.config.max_duplicates,
                    "Duplicate quota reached, skipping remaining batches"
                );
                break;
            }
        }

        Ok(())
    }

    /// Resolve the configured label filter into effective labels.
    async fn effective_labels(&self, subject: &Issue) -> Result<Vec<String>> {
        match &self.config.labels {
            LabelFilter::Unfiltered => Ok(Vec::new()),
            LabelFilter::Explicit(labels) => Ok(labels.clone()),
            LabelFilter::Auto => {
                let catalog = self.tracker.list_labels().await?;
                Ok(labels::infer(
                    self.oracle.as_ref(),
                    &self.prompts,
                    subject,
                    &catalog,
                )
                .await)
            }
        }
    }
}
