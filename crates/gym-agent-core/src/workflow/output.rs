//! Helpers for reading structured data out of free-text agent replies.

use std::sync::LazyLock;

use regex::Regex;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").expect("fenced block regex is valid")
});

/// Find a JSON object in an agent reply.
///
/// Tried in order: the whole reply, each fenced code block, then the span
/// from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let parse = |candidate: &str| {
        serde_json::from_str::<serde_json::Value>(candidate.trim())
            .ok()
            .filter(|v| v.is_object())
    };

    if let Some(v) = parse(text) {
        return Some(v);
    }

    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(v) = parse(&caps[1]) {
            return Some(v);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse(&text[start..=end])
}

/// Fields of `required` that are absent, non-string, or blank in `value`.
pub fn missing_fields(value: &serde_json::Value, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|f| {
            value
                .get(f.as_str())
                .and_then(|v| v.as_str())
                .map(|s| s.trim().is_empty())
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}
