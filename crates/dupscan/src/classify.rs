//! Token-budgeted batch classification.
//!
//! Candidates are partitioned into consecutive batches of
//! `ceil(flex_budget / tokens_per_issue)` issues; each non-empty batch costs
//! exactly one oracle request and yields zero or more duplicate findings.

use oracle::{parse, ModelTier, Oracle, OracleRequest, ResponseKind};
use serde_json::json;
use tracing::{trace, warn};
use tracker::Issue;

use crate::config::{ScanConfig, FLEX_TOKEN_BUDGET};
use crate::prompts::PromptManager;
use crate::report::DuplicateFinding;
use crate::tokens;

/// Per-candidate duplicate determination.
///
/// A narrow parser boundary over the oracle's free-text verdict token: a
/// verdict is `Duplicate` iff the text contains `DUP` and does not contain
/// `UNI`. Ambiguous output (both tokens) maps to `Unique` - free-text tokens
/// from a generative oracle are unreliable, so acceptance is strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Duplicate,
    Unique,
}

impl Verdict {
    /// Derive a verdict from raw oracle text.
    #[must_use]
    pub fn from_oracle(text: &str) -> Self {
        if text.contains("DUP") && !text.contains("UNI") {
            Self::Duplicate
        } else {
            Self::Unique
        }
    }
}

/// Classifies candidate batches against one subject issue.
pub struct BatchClassifier<'a> {
    oracle: &'a dyn Oracle,
    prompts: &'a PromptManager,
    config: &'a ScanConfig,
}

impl<'a> BatchClassifier<'a> {
    pub fn new(oracle: &'a dyn Oracle, prompts: &'a PromptManager, config: &'a ScanConfig) -> Self {
        Self {
            oracle,
            prompts,
            config,
        }
    }

    /// Classify one batch with a single oracle request.
    ///
    /// Oracle errors and unparseable responses are per-batch recoverable:
    /// they are logged and yield no findings.
    pub async fn classify_batch(&self, subject: &Issue, batch: &[Issue]) -> Vec<DuplicateFinding> {
        if batch.is_empty() {
            return Vec::new();
        }

        // Flex the per-candidate allowance so the batch collectively fits the
        // budget; the final short batch gets more room per candidate.
        let per_candidate = FLEX_TOKEN_BUDGET as usize / batch.len();
        let subject_cap = self.config.subject_token_cap() as usize;

        let prompt = match self.prompts.render(
            "classify",
            &json!({
                "subject_title": subject.title,
                "subject_body": tokens::truncate_to_tokens(&subject.body, subject_cap),
                "candidates": batch.iter().map(|c| json!({
                    "number": c.number,
                    "title": c.title,
                    "body": tokens::truncate_to_tokens(&c.body, per_candidate),
                })).collect::<Vec<_>>(),
            }),
        ) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Failed to render classify prompt, skipping batch");
                return Vec::new();
            }
        };

        let request = OracleRequest::new(ModelTier::Small, prompt)
            .with_response(ResponseKind::Tabular)
            .with_flex_tokens(FLEX_TOKEN_BUDGET)
            .with_system_safety(true);

        let response = match self.oracle.run(&request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(subject = subject.number, error = %e, "Oracle error, skipping batch");
                return Vec::new();
            }
        };

        // Prefer a fenced csv block; otherwise strip fencing heuristically.
        let table = response
            .fence("csv")
            .map_or_else(|| parse::strip_fences(&response.text).to_string(), |f| f.content.clone());

        accept_rows(&parse::parse_table_rows(&table), batch)
    }
}

/// Apply the acceptance rule to parsed response rows.
///
/// A row is accepted iff its issue number matches a candidate in this batch
/// and its verdict text passes [`Verdict::from_oracle`]. Malformed rows and
/// unmatched numbers are skipped.
pub fn accept_rows(rows: &[Vec<String>], batch: &[Issue]) -> Vec<DuplicateFinding> {
    let mut findings = Vec::new();

    for row in rows {
        let Some(number) = row
            .first()
            .and_then(|f| f.trim().trim_start_matches('#').parse::<u64>().ok())
        else {
            trace!(?row, "Row without a leading issue number, skipping");
            continue;
        };
        let Some(candidate) = batch.iter().find(|c| c.number == number) else {
            trace!(number, "Row does not match a candidate in this batch, skipping");
            continue;
        };

        // (number, reasoning.., verdict): unquoted commas split the reasoning,
        // so everything between the first and last field belongs to it.
        let (reasoning, verdict_text) = match row.len() {
            0 | 1 => continue,
            2 => (String::new(), row[1].as_str()),
            n => (row[1..n - 1].join(", "), row[n - 1].as_str()),
        };

        if Verdict::from_oracle(verdict_text) == Verdict::Duplicate {
            findings.push(DuplicateFinding {
                candidate: candidate.clone(),
                reasoning: format!("#{number}: {reasoning}"),
                confirmed: false,
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn issue(number: u64) -> Issue {
        Issue {
            number,
            title: format!("issue {number}"),
            body: String::new(),
            labels: Vec::new(),
            url: format!("https://example.com/{number}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn rows(raw: &str) -> Vec<Vec<String>> {
        oracle::parse::parse_table_rows(raw)
    }

    #[test]
    fn test_verdict_strictness() {
        assert_eq!(Verdict::from_oracle("DUP"), Verdict::Duplicate);
        assert_eq!(Verdict::from_oracle("clearly DUP here"), Verdict::Duplicate);
        assert_eq!(Verdict::from_oracle("UNI"), Verdict::Unique);
        // Ambiguous output is never accepted
        assert_eq!(Verdict::from_oracle("DUPUNI"), Verdict::Unique);
        assert_eq!(Verdict::from_oracle("DUP or UNI"), Verdict::Unique);
        // Lowercase tokens are not in the vocabulary
        assert_eq!(Verdict::from_oracle("dup"), Verdict::Unique);
        assert_eq!(Verdict::from_oracle(""), Verdict::Unique);
    }

    #[test]
    fn test_accept_rows_example_scenario() {
        let batch = vec![issue(42), issue(43), issue(44)];
        let findings = accept_rows(
            &rows("42,\"same trace\",DUP\n43,\"unrelated\",UNI\n44,\"maybe\",DUPUNI"),
            &batch,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].candidate.number, 42);
        assert_eq!(findings[0].reasoning, "#42: same trace");
        assert!(!findings[0].confirmed);
    }

    #[test]
    fn test_accept_rows_unmatched_number_skipped() {
        let batch = vec![issue(1)];
        let findings = accept_rows(&rows("999,\"looks close\",DUP"), &batch);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_accept_rows_hash_prefix_and_unquoted_commas() {
        let batch = vec![issue(7)];
        let findings = accept_rows(&rows("#7,same panic, same module,DUP"), &batch);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].reasoning, "#7: same panic, same module");
    }

    #[test]
    fn test_accept_rows_malformed_rows_skipped() {
        let batch = vec![issue(7)];
        let findings = accept_rows(&rows("garbage line\n7"), &batch);
        assert!(findings.is_empty());
    }
}
