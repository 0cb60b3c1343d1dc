/// Tags as the tag box expects them: `a, b, c`.
/// Commas separate tags; without any comma, whitespace does.
pub fn normalize_tags(tags: &str) -> String {
    let parts: Vec<&str> = if tags.contains(',') {
        tags.split(',').collect()
    } else {
        tags.split_whitespace().collect()
    };

    parts.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quotes a string for use inside an XPath expression.
/// XPath 1.0 has no escapes, so mixed quotes need `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let parts: Vec<String> = value.split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
