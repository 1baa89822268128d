//! Tolerant parsers for structured oracle output.
//!
//! Generative models fence their output inconsistently and drift from the
//! requested format; every parser here degrades to an empty result rather
//! than erroring.

/// Strip a leading/trailing markdown fence from raw text, if present.
///
/// Handles both tagged (```csv) and untagged fences; returns the input
/// unchanged when no fence is found.
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => return trimmed,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse delimited rows of fields, honoring double-quoted fields.
///
/// Blank lines and lines with no fields are skipped; quotes may wrap any
/// field and `""` escapes a literal quote inside one. Malformed lines still
/// yield their best-effort fields.
#[must_use]
pub fn parse_table_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field = String::new();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());

    if fields.iter().all(String::is_empty) {
        None
    } else {
        Some(fields)
    }
}

/// Parse `key = value` lines, preserving line order.
///
/// Lines without `=` or with an empty key are skipped.
#[must_use]
pub fn parse_key_values(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tagged_fence() {
        assert_eq!(strip_fences("```csv\n1,a,DUP\n```"), "1,a,DUP");
        assert_eq!(strip_fences("```\nraw\n```"), "raw");
        assert_eq!(strip_fences("no fence here"), "no fence here");
    }

    #[test]
    fn test_strip_unclosed_fence() {
        assert_eq!(strip_fences("```csv\n42,x,DUP"), "42,x,DUP");
    }

    #[test]
    fn test_parse_rows_quoted_fields() {
        let rows = parse_table_rows("42,\"same trace, same panic\",DUP\n43,unrelated,UNI");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["42", "same trace, same panic", "DUP"]);
        assert_eq!(rows[1], vec!["43", "unrelated", "UNI"]);
    }

    #[test]
    fn test_parse_rows_escaped_quote() {
        let rows = parse_table_rows(r#"7,"says ""crash"" twice",DUP"#);
        assert_eq!(rows[0][1], r#"says "crash" twice"#);
    }

    #[test]
    fn test_parse_rows_skips_blank_lines() {
        let rows = parse_table_rows("\n  \n1,a,DUP\n\n");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_parse_rows_malformed_line_best_effort() {
        let rows = parse_table_rows("not really a row");
        assert_eq!(rows, vec![vec!["not really a row".to_string()]]);
    }

    #[test]
    fn test_parse_key_values() {
        let pairs = parse_key_values("bug = crash on start\nui = rendering glitch\nno equals");
        assert_eq!(
            pairs,
            vec![
                ("bug".to_string(), "crash on start".to_string()),
                ("ui".to_string(), "rendering glitch".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_key_values_empty_key_skipped() {
        assert!(parse_key_values("= orphan value").is_empty());
    }
}
