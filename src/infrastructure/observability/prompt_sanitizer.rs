const MAX_VISIBLE_CHARS: usize = 80;

/// Sanitizes user message text for safe logging: truncated preview with
/// credential-looking fragments redacted.
pub fn sanitize_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let sanitized = if trimmed.chars().count() > MAX_VISIBLE_CHARS {
        let preview: String = trimmed.chars().take(MAX_VISIBLE_CHARS).collect();
        format!("{}... ({} chars total)", preview, trimmed.chars().count())
    } else {
        trimmed.to_string()
    };

    redact_sensitive_patterns(&sanitized)
}

fn redact_sensitive_patterns(text: &str) -> String {
    let patterns = [
        ("Bearer ", "Bearer [REDACTED]"),
        ("api_key=", "api_key=[REDACTED]"),
        ("password=", "password=[REDACTED]"),
        ("secret=", "secret=[REDACTED]"),
        ("token=", "token=[REDACTED]"),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        let mut search_from = 0;
        while let Some(offset) = result[search_from..].find(pattern) {
            let idx = search_from + offset;
            let end = result[idx + pattern.len()..]
                .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
                .map(|i| idx + pattern.len() + i)
                .unwrap_or(result.len());
            result.replace_range(idx..end, replacement);
            // Resume past the replacement; it contains the pattern itself.
            search_from = idx + replacement.len();
        }
    }

    result
}
