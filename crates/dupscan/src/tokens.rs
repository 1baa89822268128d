//! Token estimation and truncation.
//!
//! Budgets are approximate by nature: the oracle counts tokens with its own
//! tokenizer, so a chars-per-token heuristic is enough to keep batches inside
//! the flex budget.

/// Rough chars-per-token ratio for English prose.
const CHARS_PER_TOKEN: usize = 4;

/// Approximate token count of a text.
#[must_use]
pub fn approx_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Truncate a text to roughly `max_tokens`, on a char boundary.
#[must_use]
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> &str {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
