//! Oracle trait and common request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Capability tier of the model backing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheap bulk model used for batch classification and label ranking.
    Small,
    /// Higher-capability model used for one-off confirmation checks.
    Large,
}

/// Expected shape of the oracle's answer.
///
/// This is a hint: providers may use it to steer sampling, and callers still
/// parse the response tolerantly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Text,
    /// Delimited rows, ideally inside a fenced `csv` block.
    Tabular,
    /// `key = value` lines, ideally inside a fenced `ini` block.
    KeyValue,
}

/// A single oracle request.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// Optional system prompt.
    pub system: Option<String>,
    /// User prompt content.
    pub prompt: String,
    pub model: ModelTier,
    /// Flexible token allowance for the response.
    pub flex_tokens: u32,
    pub response: ResponseKind,
    /// Ask the provider to apply its safety system prompt.
    pub system_safety: bool,
}

impl OracleRequest {
    /// Create a request with default response shaping.
    #[must_use]
    pub fn new(model: ModelTier, prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            model,
            flex_tokens: 4096,
            response: ResponseKind::Text,
            system_safety: false,
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: ResponseKind) -> Self {
        self.response = response;
        self
    }

    #[must_use]
    pub fn with_flex_tokens(mut self, flex_tokens: u32) -> Self {
        self.flex_tokens = flex_tokens;
        self
    }

    #[must_use]
    pub fn with_system_safety(mut self, system_safety: bool) -> Self {
        self.system_safety = system_safety;
        self
    }
}

/// A fenced code block extracted from oracle output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// Language tag on the opening fence, empty when untagged.
    pub language: String,
    pub content: String,
}

/// Oracle response: raw text plus any fenced blocks found in it.
#[derive(Debug, Clone, Default)]
pub struct OracleResponse {
    pub text: String,
    pub fences: Vec<Fence>,
}

impl OracleResponse {
    /// Build a response from raw text, extracting fenced blocks.
    #[must_use]
    pub fn from_text(text: String) -> Self {
        let fences = extract_fences(&text);
        Self { text, fences }
    }

    /// First fenced block with the given language tag.
    #[must_use]
    pub fn fence(&self, language: &str) -> Option<&Fence> {
        self.fences
            .iter()
            .find(|f| f.language.eq_ignore_ascii_case(language))
    }
}

/// Trait for text oracles.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Provider name (e.g. "anthropic").
    fn name(&self) -> &'static str;

    /// Execute one request and return the response text plus fences.
    async fn run(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

/// Extract fenced code blocks (``` delimited) from free text.
///
/// Unclosed trailing fences are kept; generative output is routinely cut off
/// mid-block and the content before the cut is still usable.
#[must_use]
pub fn extract_fences(text: &str) -> Vec<Fence> {
    let mut fences = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("```") {
            match current.take() {
                Some((language, content)) => {
                    fences.push(Fence {
                        language,
                        content: content.trim_end().to_string(),
                    });
                }
                None => {
                    current = Some((rest.trim().to_string(), String::new()));
                }
            }
        } else if let Some((_, content)) = current.as_mut() {
            content.push_str(line);
            content.push('\n');
        }
    }

    if let Some((language, content)) = current {
        let content = content.trim_end().to_string();
        if !content.is_empty() {
            fences.push(Fence { language, content });
        }
    }

    fences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single_fence() {
        let text = "Here you go:\n```csv\n1,a,DUP\n2,b,UNI\n```\nDone.";
        let fences = extract_fences(text);
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0].language, "csv");
        assert_eq!(fences[0].content, "1,a,DUP\n2,b,UNI");
    }

    #[test]
    fn test_extract_multiple_and_untagged() {
        let text = "```ini\nbug = crash\n```\ntext\n```\nraw\n```";
        let fences = extract_fences(text);
        assert_eq!(fences.len(), 2);
        assert_eq!(fences[0].language, "ini");
        assert_eq!(fences[1].language, "");
        assert_eq!(fences[1].content, "raw");
    }

    #[test]
    fn test_extract_unclosed_fence_kept() {
        let text = "```csv\n42,\"same trace\",DUP";
        let fences = extract_fences(text);
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0].content, "42,\"same trace\",DUP");
    }

    #[test]
    fn test_no_fences() {
        assert!(extract_fences("plain text, no blocks").is_empty());
    }

    #[test]
    fn test_response_fence_lookup() {
        let resp = OracleResponse::from_text("```CSV\n1,x,DUP\n```".to_string());
        assert!(resp.fence("csv").is_some());
        assert!(resp.fence("ini").is_none());
    }
}
