//! Confirmation stage: re-check each first-stage duplicate with the large
//! model.
//!
//! A strict filter: confirmation only removes candidates from the duplicate
//! set, never adds. Each call is fully self-contained.

use oracle::{ModelTier, Oracle, OracleRequest, ResponseKind};
use serde_json::json;
use tracing::{debug, warn};
use tracker::Issue;

use crate::classify::Verdict;
use crate::prompts::PromptManager;
use crate::report::DuplicateFinding;
use crate::tokens;

/// Token cap for each side of the confirmation prompt.
const SIDE_TOKEN_CAP: usize = 3000;

/// Response allowance for the reasoning paragraph plus verdict line.
const RESPONSE_TOKENS: u32 = 1000;

/// Confirm or reject one first-stage finding in place.
///
/// On rejection (or oracle failure) the finding stays unconfirmed and its
/// reasoning is annotated; the reasoning is appended to, never overwritten.
pub async fn confirm_finding(
    oracle: &dyn Oracle,
    prompts: &PromptManager,
    subject: &Issue,
    finding: &mut DuplicateFinding,
) {
    let candidate = &finding.candidate;

    let prompt = match prompts.render(
        "confirm",
        &json!({
            "candidate_number": candidate.number,
            "candidate_title": candidate.title,
            "candidate_body": tokens::truncate_to_tokens(&candidate.body, SIDE_TOKEN_CAP),
            "subject_number": subject.number,
            "subject_title": subject.title,
            "subject_body": tokens::truncate_to_tokens(&subject.body, SIDE_TOKEN_CAP),
        }),
    ) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Failed to render confirm prompt");
            finding
                .reasoning
                .push_str(&format!(" (confirmation failed: {e})"));
            return;
        }
    };

    let request = OracleRequest::new(ModelTier::Large, prompt)
        .with_flex_tokens(RESPONSE_TOKENS)
        .with_response(ResponseKind::Text)
        .with_system_safety(true);

    match oracle.run(&request).await {
        Ok(response) => {
            if Verdict::from_oracle(&response.text) == Verdict::Duplicate {
                finding.confirmed = true;
                debug!(
                    subject = subject.number,
                    candidate = candidate.number,
                    "Duplicate confirmed"
                );
            } else {
                finding.reasoning.push_str(&format!(
                    " (not confirmed by large model: {})",
                    response.text.trim()
                ));
                debug!(
                    subject = subject.number,
                    candidate = candidate.number,
                    "Duplicate rejected by confirmation"
                );
            }
        }
        Err(e) => {
            // Strict filter: an unverifiable finding is not a duplicate.
            warn!(
                subject = subject.number,
                candidate = candidate.number,
                error = %e,
                "Confirmation call failed, treating as not confirmed"
            );
            finding
                .reasoning
                .push_str(&format!(" (confirmation failed: {e})"));
        }
    }
}
