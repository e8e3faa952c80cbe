//! Hashing and log-safe previews for pipeline tracing.

use serde_json::Value;
use sha2::{Digest, Sha256};

const TRUNCATION_MARKER: &str = "...[truncated]";
const REDACTED: &str = "[REDACTED]";

/// Fields never written to logs verbatim.
const SENSITIVE_FIELDS: &[&str] = &["candidate_answer"];

/// First 12 hex chars of the SHA-256 of `text`.
///
/// # Examples
///
/// ```
/// use interview_core::pipeline::content_hash;
///
/// assert_eq!(content_hash("abc"), "ba7816bf8f01");
/// ```
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

/// Cuts `text` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// A copy of a user payload with sensitive fields replaced.
#[must_use]
pub fn redacted(payload: &Value) -> Value {
    let mut safe = payload.clone();
    if let Value::Object(object) = &mut safe {
        for field in SENSITIVE_FIELDS {
            if let Some(value) = object.get_mut(*field) {
                *value = Value::String(REDACTED.to_string());
            }
        }
    }
    safe
}
