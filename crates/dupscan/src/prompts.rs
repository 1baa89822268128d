//! Prompt template management.

use anyhow::Result;
use handlebars::Handlebars;
use serde::Serialize;

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        handlebars.register_template_string("labels", LABELS_TEMPLATE)?;
        handlebars.register_template_string("classify", CLASSIFY_TEMPLATE)?;
        handlebars.register_template_string("confirm", CONFIRM_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        let result = self.handlebars.render(template, data)?;
        Ok(result)
    }
}

/// Label ranking prompt template.
const LABELS_TEMPLATE: &str = r#"You are triaging an issue tracker. Rank which of the repository's labels
apply to the issue below.

## Available labels
{{#each labels}}
- {{{name}}}: {{{description}}}
{{/each}}

## Issue
Title: {{{title}}}

{{{body}}}

Respond with a fenced ```ini block containing one `label = reasoning` line per
applicable label, most relevant first, at most three lines. Use only label
names from the list above. If no label applies, respond with exactly:
no label"#;

/// Batch duplicate-classification prompt template.
const CLASSIFY_TEMPLATE: &str = r#"Determine which of the candidate issues below are duplicates of the subject
issue. A duplicate reports the same underlying problem, even if worded
differently.

## Subject issue
Title: {{{subject_title}}}

{{{subject_body}}}

## Candidate issues
{{#each candidates}}
### Issue #{{number}}
Title: {{{title}}}

{{{body}}}

{{/each}}
Respond with a fenced ```csv block containing exactly one row per candidate:
issue_number,"reasoning",verdict

The verdict must be DUP if the candidate is a duplicate of the subject, UNI
otherwise. Always quote the reasoning field."#;

/// Single-pair confirmation prompt template.
const CONFIRM_TEMPLATE: &str = r#"Decide whether these two issue reports describe the same underlying problem.

## Existing issue #{{candidate_number}}
Title: {{{candidate_title}}}

{{{candidate_body}}}

## New issue #{{subject_number}}
Title: {{{subject_title}}}

{{{subject_body}}}

Explain your reasoning in one short paragraph, then finish with a single line
containing only DUP (same underlying problem) or UNI (different problems)."#;
