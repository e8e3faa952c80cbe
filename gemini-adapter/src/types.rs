//! Wire types for `generateContent`.

use serde::Serialize;
use serde_json::Value;

/// One text part.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Part<'a> {
    /// Text content.
    pub text: &'a str,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Content<'a> {
    /// Speaker role.
    pub role: &'a str,
    /// Parts of the turn.
    pub parts: Vec<Part<'a>>,
}

/// System instruction block.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SystemInstruction<'a> {
    /// Instruction parts.
    pub parts: Vec<Part<'a>>,
}

/// Sampling settings.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    /// Conversation, here always one user turn.
    pub contents: Vec<Content<'a>>,
    /// System instruction, omitted when blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction<'a>>,
    /// Sampling settings, omitted when the provider default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    /// A single-turn request.
    #[must_use]
    pub fn new(system_prompt: &'a str, user_prompt: &'a str, temperature: Option<f32>) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: user_prompt }],
            }],
            system_instruction: (!system_prompt.trim().is_empty()).then(|| SystemInstruction {
                parts: vec![Part {
                    text: system_prompt,
                }],
            }),
            generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
        }
    }
}

/// Text of the first candidate that has any text parts, parts joined with
/// newlines and trimmed.
///
/// Malformed candidates are skipped rather than rejected.
#[must_use]
pub fn extract_text(response: &Value) -> Option<String> {
    response
        .get("candidates")?
        .as_array()?
        .iter()
        .find_map(|candidate| {
            let parts = candidate.get("content")?.get("parts")?.as_array()?;
            let chunks: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text")?.as_str())
                .collect();
            (!chunks.is_empty()).then(|| chunks.join("\n").trim().to_string())
        })
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_omits_optional_blocks() {
        let body = serde_json::to_value(GenerateContentRequest::new("  ", "hi", None)).unwrap();
        assert_eq!(
            body,
            json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_request_body_full() {
        let body = serde_json::to_value(GenerateContentRequest::new("sys", "hi", Some(0.5))).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_extract_text_skips_malformed_candidates() {
        let response = json!({
            "candidates": [
                "garbage",
                {"content": {"parts": [{"inlineData": {}}]}},
                {"content": {"parts": [{"text": " first "}, {"text": "second "}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("first \nsecond"));
    }

    #[test]
    fn test_extract_text_none_without_text() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({"candidates": {}})), None);
        assert_eq!(
            extract_text(&json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]})),
            None
        );
    }
}
