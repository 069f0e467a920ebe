//! Text helpers shared by the prompt builders and report writers.

/// Truncate `text` to at most `max_chars` characters, on a char boundary.
///
/// # Examples
///
/// ```
/// use sales_call_insights::utils::truncate_chars;
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("hi", 10), "hi");
/// ```
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Take up to `limit` non-empty texts, in order.
pub fn non_empty<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<&'a str> {
    texts
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .take(limit)
        .collect()
}

/// Render texts as a `- item` list, truncating each to `max_chars`.
#[must_use]
pub fn bullet_list(texts: &[&str], max_chars: usize) -> String {
    texts
        .iter()
        .map(|t| format!("- {}", truncate_chars(t, max_chars)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a possibly-NaN number for humans.
#[must_use]
pub fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}
