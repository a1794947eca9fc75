//! Text extraction from the SVG cards rendered by the badge service.

use regex::Regex;

/// Find the text of the `<text>` element tagged with `data-testid="{test_id}"`.
///
/// Surrounding whitespace is trimmed and the predefined XML entities are decoded. Returns `None` when the
/// element is absent or its text is empty.
#[must_use]
pub fn extract_text_node(svg: &str, test_id: &str) -> Option<String> {
    let pattern = format!(r#"<(?:[\w-]+:)?text\b[^>]*?\sdata-testid\s*=\s*["']{}["'][^>]*>([^<]*)<"#, regex::escape(test_id));
    let re = Regex::new(&pattern).ok()?;

    let text = decode_entities(re.captures(svg)?.get(1)?.as_str().trim());
    if text.is_empty() { None } else { Some(text) }
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Keep the first two characters of a percentage text and append `%`.
///
/// `"95% merged"` becomes `"95%"`; a `%` already among the kept characters is not doubled. Returns `None`
/// for empty input.
#[must_use]
pub fn truncate_percentage(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let kept: String = raw.chars().take(2).collect();
    let digits = kept.trim_end_matches(|c: char| c == '%' || c.is_whitespace());
    if digits.is_empty() {
        return None;
    }

    Some(format!("{digits}%"))
}
