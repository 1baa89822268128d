//! Label inference: ask the oracle which tracker labels fit a subject issue.

use oracle::{parse, ModelTier, Oracle, OracleRequest, ResponseKind};
use serde_json::json;
use tracing::{debug, warn};
use tracker::{Issue, LabelInfo};

use crate::prompts::PromptManager;
use crate::tokens;

/// Catalog entries never offered to the oracle.
const DISALLOWED_LABELS: &[&str] = &["duplicate", "wontfix"];

/// Maximum number of inferred labels.
const MAX_INFERRED: usize = 3;

/// Token cap for the subject excerpt in the inference prompt.
const SUBJECT_TOKEN_CAP: usize = 2000;

/// Infer up to three applicable labels for a subject issue.
///
/// Oracle failure is non-fatal and yields an empty set, which makes the
/// downstream candidate fetch unfiltered.
pub async fn infer(
    oracle: &dyn Oracle,
    prompts: &PromptManager,
    subject: &Issue,
    catalog: &[LabelInfo],
) -> Vec<String> {
    let allowed: Vec<&LabelInfo> = catalog
        .iter()
        .filter(|l| {
            !DISALLOWED_LABELS
                .iter()
                .any(|d| l.name.eq_ignore_ascii_case(d))
        })
        .collect();
    if allowed.is_empty() {
        return Vec::new();
    }

    let prompt = match prompts.render(
        "labels",
        &json!({
            "labels": allowed.iter().map(|l| json!({
                "name": l.name,
                "description": l.description,
            })).collect::<Vec<_>>(),
            "title": subject.title,
            "body": tokens::truncate_to_tokens(&subject.body, SUBJECT_TOKEN_CAP),
        }),
    ) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Failed to render label prompt");
            return Vec::new();
        }
    };

    let request = OracleRequest::new(ModelTier::Small, prompt)
        .with_response(ResponseKind::KeyValue)
        .with_flex_tokens(600)
        .with_system_safety(true);

    let response = match oracle.run(&request).await {
        Ok(r) => r,
        Err(e) => {
            warn!(subject = subject.number, error = %e, "Label inference failed, retrieval will be unfiltered");
            return Vec::new();
        }
    };

    // Prefer a fenced key/value block, fall back to the raw text.
    let text = response
        .fence("ini")
        .map_or_else(|| parse::strip_fences(&response.text).to_string(), |f| f.content.clone());

    let pairs = parse::parse_key_values(&text);
    let selected = select_labels(&pairs, &allowed);
    debug!(subject = subject.number, labels = ?selected, "Inferred labels");
    selected
}

/// Keep only labels present in the allowed catalog, preserving rank order,
/// deduplicated, capped at three.
fn select_labels(pairs: &[(String, String)], allowed: &[&LabelInfo]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for (key, _reasoning) in pairs {
        let Some(info) = allowed
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(key.trim()))
        else {
            continue;
        };
        if selected.iter().any(|s| s == &info.name) {
            continue;
        }
        selected.push(info.name.clone());
        if selected.len() == MAX_INFERRED {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<LabelInfo> {
        names
            .iter()
            .map(|n| LabelInfo {
                name: (*n).to_string(),
                description: String::new(),
            })
            .collect()
    }

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_select_preserves_rank_order() {
        let catalog = catalog(&["bug", "ui", "perf"]);
        let allowed: Vec<&LabelInfo> = catalog.iter().collect();
        let selected = select_labels(
            &pairs(&[("perf", "slow"), ("bug", "crashes")]),
            &allowed,
        );
        assert_eq!(selected, vec!["perf", "bug"]);
    }

    #[test]
    fn test_select_drops_unknown_and_dedupes() {
        let catalog = catalog(&["bug"]);
        let allowed: Vec<&LabelInfo> = catalog.iter().collect();
        let selected = select_labels(
            &pairs(&[("invented", "x"), ("BUG", "y"), ("bug", "z")]),
            &allowed,
        );
        assert_eq!(selected, vec!["bug"]);
    }

    #[test]
    fn test_select_caps_at_three() {
        let catalog = catalog(&["a", "b", "c", "d"]);
        let allowed: Vec<&LabelInfo> = catalog.iter().collect();
        let selected = select_labels(
            &pairs(&[("a", ""), ("b", ""), ("c", ""), ("d", "")]),
            &allowed,
        );
        assert_eq!(selected.len(), 3);
    }
}
