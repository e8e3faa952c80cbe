//! Failure classification and repair payloads.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::contracts::{Contract, ContractError, ContractKind, Violation};
use crate::extract::extract_json_text;

/// Why a model output was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// No JSON value could be decoded.
    Decode,
    /// Decoded, but field or cross-field rules are broken.
    Validation,
    /// Decoded, but not an object or with undeclared keys.
    Shape,
}

impl FailureKind {
    /// Wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Validation => "validation",
            Self::Shape => "shape",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected model output, with enough context to ask for a targeted fix.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub message: String,
    /// The decoded object, when decoding got that far.
    pub parsed: Option<Map<String, Value>>,
    /// Per-field violations, for validation failures.
    pub violations: Vec<Violation>,
}

/// Extracts, decodes and validates one model output.
///
/// # Errors
///
/// Returns a [`Failure`] classifying the first layer that rejected `raw`.
pub fn parse_and_validate<C: Contract>(raw: &str) -> Result<C, Failure> {
    let text = extract_json_text(raw);
    let value: Value = serde_json::from_str(text).map_err(|err| Failure {
        kind: FailureKind::Decode,
        message: err.to_string(),
        parsed: None,
        violations: Vec::new(),
    })?;

    C::from_value(&value).map_err(|err| {
        let parsed = match value {
            Value::Object(object) => Some(object),
            _ => None,
        };
        match err {
            ContractError::Shape(shape) => Failure {
                kind: FailureKind::Shape,
                message: shape.to_string(),
                parsed,
                violations: Vec::new(),
            },
            ContractError::Validation(validation) => Failure {
                kind: FailureKind::Validation,
                message: validation.to_string(),
                parsed,
                violations: validation.violations().to_vec(),
            },
        }
    })
}

/// User payload of a repair call.
///
/// Serialized compactly and handed to the model together with the repair
/// system prompt.
#[derive(Debug, Clone, Serialize)]
pub struct RepairPayload<'a> {
    /// Schema name of the contract the output must satisfy.
    pub target: &'static str,
    /// The rejected output, verbatim.
    pub raw_output: &'a str,
    /// Failure class.
    pub error_kind: FailureKind,
    /// Failure message.
    pub error: &'a str,
    /// Best-effort decoded object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_json_object: Option<&'a Map<String, Value>>,
    /// Per-field violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<&'a [Violation]>,
    /// Published schema document of the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
}

impl<'a> RepairPayload<'a> {
    /// Builds the payload for a failed output of `kind`.
    #[must_use]
    pub fn new(kind: ContractKind, raw_output: &'a str, failure: &'a Failure) -> Self {
        Self {
            target: kind.schema_name(),
            raw_output,
            error_kind: failure.kind,
            error: &failure.message,
            parsed_json_object: failure.parsed.as_ref(),
            validation_errors: (failure.kind == FailureKind::Validation)
                .then_some(failure.violations.as_slice()),
            json_schema: None,
        }
    }

    /// Embeds the target's schema document.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{Evaluation, Rule};
    use serde_json::json;

    #[test]
    fn test_decode_failure() {
        let failure = parse_and_validate::<Evaluation>("not json at all").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Decode);
        assert!(failure.parsed.is_none());
        assert!(failure.violations.is_empty());
    }

    #[test]
    fn test_non_object_is_shape_failure() {
        let failure = parse_and_validate::<Evaluation>("[1, 2, 3]").unwrap_err();
        assert_eq!(failure.kind, FailureKind::Shape);
        assert!(failure.parsed.is_none());
    }

    #[test]
    fn test_validation_failure_keeps_object_and_violations() {
        let raw = r#"Sure! {"score": 70, "strengths": [], "missing_points": [],
            "incorrect_points": [], "ideal_answer": "ref", "improvement_tips": [],
            "clarifying_questions": [], "followup_question": ""}"#;
        let failure = parse_and_validate::<Evaluation>(raw).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.parsed.as_ref().unwrap()["score"], 70);
        assert_eq!(failure.violations[0].rule, Rule::FollowupPolicy);
    }

    #[test]
    fn test_repair_payload_fields() {
        let failure = parse_and_validate::<Evaluation>(r#"{"score": 5, "extra": true}"#)
            .unwrap_err();
        let payload = RepairPayload::new(ContractKind::Evaluation, "raw", &failure);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["target"], "EvaluationJSON");
        assert_eq!(value["error_kind"], "shape");
        assert_eq!(value["parsed_json_object"]["extra"], true);
        assert!(value.get("validation_errors").is_none());
        assert!(value.get("json_schema").is_none());

        let with_schema = payload.with_schema(json!({"type": "object"}));
        assert_eq!(
            serde_json::to_value(&with_schema).unwrap()["json_schema"]["type"],
            "object"
        );
    }
}
