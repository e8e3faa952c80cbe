//! Pulls one JSON object out of noisy model output.
//!
//! Models wrap JSON in markdown fences, prepend commentary, or emit several
//! brace-delimited fragments. [`extract_json_text`] never fails: it returns
//! its best candidate and leaves the decode to the caller, so a hopeless
//! input still produces a precise parse error downstream.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static LEADING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)^```[a-z0-9_+-]*\s*").unwrap()
});

static TRAILING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\s*```$").unwrap()
});

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Returns the most plausible JSON object text inside `raw`.
///
/// In order:
/// 1. trim, drop a leading byte-order mark;
/// 2. drop one leading fence (with optional language tag) and one trailing fence;
/// 3. fast path: first `{` through last `}`, if that parses;
/// 4. slow path: the leftmost `{` from which a JSON object decodes;
/// 5. otherwise the fence-stripped text unchanged.
///
/// # Examples
///
/// ```
/// use interview_core::extract::extract_json_text;
///
/// let raw = "noise before```json\n{\"a\":1,\"b\":2}\n```noise after";
/// assert_eq!(extract_json_text(raw), "{\"a\":1,\"b\":2}");
/// ```
#[must_use]
pub fn extract_json_text(raw: &str) -> &str {
    let text = strip_fences(raw);

    if let Some(candidate) = outermost_braces(text) {
        if serde_json::from_str::<Value>(candidate).is_ok() {
            return candidate;
        }
    }

    first_decodable_object(text).unwrap_or(text)
}

fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text).trim_start();

    if let Some(fence) = LEADING_FENCE.find(text) {
        text = &text[fence.end()..];
    }
    if let Some(fence) = TRAILING_FENCE.find(text) {
        text = &text[..fence.start()];
    }
    text.trim()
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decodes from every `{` in turn and keeps the first object that parses.
fn first_decodable_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let tail = &text[start..];
        let mut stream = serde_json::Deserializer::from_str(tail).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(_))) => Some(&tail[..stream.byte_offset()]),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_object_is_returned_as_is() {
        let raw = r#"{"a": 1}"#;
        assert_eq!(extract_json_text(raw), raw);
    }

    #[test]
    fn test_idempotent_on_clean_text() {
        let raw = "  {\"a\": {\"b\": [1, 2]}}\n";
        let once = extract_json_text(raw);
        assert_eq!(extract_json_text(once), once);
    }

    #[test]
    fn test_fenced_block_with_noise_around() {
        let raw = "noise before```json\n{\"a\":1,\"b\":2}\n```noise after";
        assert_eq!(extract_json_text(raw), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn test_fence_at_edges_with_uppercase_tag() {
        let raw = "```JSON\n{\"ok\": true}\n```";
        assert_eq!(extract_json_text(raw), "{\"ok\": true}");
    }

    #[test]
    fn test_bare_fence_without_language_tag() {
        let raw = "```\n{\"ok\": true}\n```";
        assert_eq!(extract_json_text(raw), "{\"ok\": true}");
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let raw = "\u{feff}{\"ok\": true}";
        assert_eq!(extract_json_text(raw), "{\"ok\": true}");
    }

    #[test]
    fn test_slow_path_picks_leftmost_valid_object() {
        // First-to-last brace spans both objects and does not parse.
        let raw = r#"Here: {"first": 1} and also {"second": 2}"#;
        assert_eq!(extract_json_text(raw), r#"{"first": 1}"#);
    }

    #[test]
    fn test_slow_path_skips_broken_fragment() {
        let raw = r#"{not json} then {"valid": [1, 2, 3]} trailing }"#;
        assert_eq!(extract_json_text(raw), r#"{"valid": [1, 2, 3]}"#);
    }

    #[test]
    fn test_nested_object_is_not_preferred_over_outer() {
        let raw = r#"prefix {"outer": {"inner": 1}} suffix"#;
        assert_eq!(extract_json_text(raw), r#"{"outer": {"inner": 1}}"#);
    }

    #[test]
    fn test_no_json_returns_stripped_text() {
        assert_eq!(extract_json_text("  not json at all  "), "not json at all");
        assert_eq!(extract_json_text("```json\nnope\n```"), "nope");
    }

    #[test]
    fn test_reversed_braces_fall_through() {
        assert_eq!(extract_json_text("} oops {"), "} oops {");
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let raw = "結果は次の通り: {\"name\": \"テスト\"} です";
        assert_eq!(extract_json_text(raw), "{\"name\": \"テスト\"}");
    }
}
