//! Helpers for reading JSON out of model output.

/// Remove a surrounding Markdown code fence, if any.
///
/// Models asked for bare JSON still wrap it in ```json fences now and then.
/// Nothing else is stripped: text around the JSON is left for the parser to reject.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => strip_language_tag(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Drop a leading "json " style tag from a fence that has no line break.
fn strip_language_tag(rest: &str) -> &str {
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    match rest[tag_len..].chars().next() {
        Some(c) if tag_len > 0 && c.is_whitespace() => &rest[tag_len..],
        _ => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_trimmed_only() {
        assert_eq!(strip_code_fence("  [1, 2]\n"), "[1, 2]");
        assert_eq!(strip_code_fence("Here you go: [1]"), "Here you go: [1]");
    }

    #[test]
    fn test_fences_are_removed() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_single_line_fences() {
        assert_eq!(strip_code_fence("```json [1]```"), "[1]");
        assert_eq!(strip_code_fence("```[1, 2]```"), "[1, 2]");
        assert_eq!(strip_code_fence("```JSON {\"a\": 1} ```"), "{\"a\": 1}");
    }
}
