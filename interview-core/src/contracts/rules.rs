//! Field rules, checked against the published schema documents.
//!
//! Every contract and request shape has exactly one rule set: its JSON
//! Schema document. [`check_fields`] runs that document over the raw input
//! and turns each schema error into a [`Violation`]; a non-object root or an
//! undeclared key is a [`ShapeError`] instead. Only inputs that pass are
//! normalized and decoded into typed values.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ContractError, ShapeError, ValidationError};

/// Pattern the documents use for "at least one non-whitespace character".
pub(crate) const NON_BLANK_PATTERN: &str = "\\S";

/// Name of the rule a [`Violation`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// A required field is missing.
    Required,
    /// The value has the wrong JSON type.
    Type,
    /// A string is empty or whitespace only.
    NonEmpty,
    /// A number is outside its inclusive range.
    Range,
    /// A value is not one of the enumerated values.
    Enum,
    /// A string does not match its fixed pattern.
    Pattern,
    /// A list has fewer items than allowed.
    MinItems,
    /// A list has more items than allowed.
    MaxItems,
    /// Any other keyword of the schema document.
    Schema,
    /// `coding` presence disagrees with `question_type`.
    CodingMatchesQuestionType,
    /// Clarifying questions are present but followup or score disagree.
    ClarificationPolicy,
    /// The followup question disagrees with the score threshold.
    FollowupPolicy,
}

impl Rule {
    /// Stable snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::NonEmpty => "non_empty",
            Self::Range => "range",
            Self::Enum => "enum",
            Self::Pattern => "pattern",
            Self::MinItems => "min_items",
            Self::MaxItems => "max_items",
            Self::Schema => "schema",
            Self::CodingMatchesQuestionType => "coding_matches_question_type",
            Self::ClarificationPolicy => "clarification_policy",
            Self::FollowupPolicy => "followup_policy",
        }
    }

    /// Whether this rule relates several fields rather than one.
    #[must_use]
    pub const fn is_cross_field(self) -> bool {
        matches!(
            self,
            Self::CodingMatchesQuestionType | Self::ClarificationPolicy | Self::FollowupPolicy
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single broken rule: where, which, and a readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted field path, with `[i]` for list items (e.g. `coding.requirements[0]`).
    pub path: String,
    /// The rule that failed.
    pub rule: Rule,
    /// Human-readable explanation.
    pub message: String,
}

impl Violation {
    pub(crate) fn new(path: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.rule)
    }
}

/// A schema document compiled once, or the reason it would not compile.
pub(crate) type CompiledSchema = Result<Validator, String>;

pub(crate) fn compile(document: &Value) -> CompiledSchema {
    Validator::new(document).map_err(|err| err.to_string())
}

/// JSON type name used in shape messages.
#[must_use]
pub(crate) const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Runs `schema` over `raw`.
///
/// Shape problems abort with [`ShapeError`]; every other schema error becomes
/// one [`Violation`], so a caller sees every broken field at once.
pub(crate) fn check_fields(schema: &CompiledSchema, raw: &Value) -> Result<(), ContractError> {
    if !raw.is_object() {
        return Err(ShapeError::NotAnObject {
            path: "$".to_string(),
            found: json_type(raw),
        }
        .into());
    }

    let validator = match schema {
        Ok(validator) => validator,
        Err(message) => {
            return Err(ValidationError::new(vec![Violation::new(
                "$",
                Rule::Schema,
                format!("schema compilation error: {message}"),
            )])
            .into())
        }
    };

    let mut violations: Vec<Violation> = Vec::new();
    for error in validator.iter_errors(raw) {
        let path = dotted_path(error.instance_path.as_str());
        let violation = match &error.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                return Err(ShapeError::UnknownFields {
                    path: if path.is_empty() { "$".to_string() } else { path },
                    keys: unexpected.clone(),
                }
                .into());
            }
            ValidationErrorKind::Required { property } => Violation::new(
                join(&path, property.as_str().unwrap_or_default()),
                Rule::Required,
                "field required",
            ),
            ValidationErrorKind::MinLength { limit: 1 } => {
                Violation::new(path, Rule::NonEmpty, "must not be empty")
            }
            ValidationErrorKind::Pattern { pattern } if pattern == NON_BLANK_PATTERN => {
                Violation::new(path, Rule::NonEmpty, "must not be empty")
            }
            kind => Violation::new(path, rule_of(kind), error.to_string()),
        };

        // A blank string breaks both `minLength` and the non-blank pattern.
        if !violations
            .iter()
            .any(|seen| seen.path == violation.path && seen.rule == violation.rule)
        {
            violations.push(violation);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations).into())
    }
}

const fn rule_of(kind: &ValidationErrorKind) -> Rule {
    match kind {
        ValidationErrorKind::Type { .. } => Rule::Type,
        ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => Rule::Enum,
        ValidationErrorKind::Minimum { .. }
        | ValidationErrorKind::Maximum { .. }
        | ValidationErrorKind::ExclusiveMinimum { .. }
        | ValidationErrorKind::ExclusiveMaximum { .. } => Rule::Range,
        ValidationErrorKind::MinItems { .. } => Rule::MinItems,
        ValidationErrorKind::MaxItems { .. } => Rule::MaxItems,
        ValidationErrorKind::Pattern { .. } => Rule::Pattern,
        _ => Rule::Schema,
    }
}

/// `/coding/requirements/0` becomes `coding.requirements[0]`.
fn dotted_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(segment);
            path.push(']');
        } else {
            let segment = segment.replace("~1", "/").replace("~0", "~");
            path = join(&path, &segment);
        }
    }
    path
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Copy of `value` with every string trimmed and every integral float
/// turned into an integer.
// Range rules have already bounded every integer field.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn normalized(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(text.trim().to_string()),
        Value::Number(number) if !number.is_i64() && !number.is_u64() => number
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map_or_else(|| value.clone(), |f| Value::from(f as i64)),
        Value::Array(items) => Value::Array(items.iter().map(normalized).collect()),
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, item)| (key.clone(), normalized(item)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

/// Decodes an input that already passed [`check_fields`].
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ContractError> {
    serde_json::from_value(value).map_err(|err| {
        ValidationError::new(vec![Violation::new("$", Rule::Schema, err.to_string())]).into()
    })
}

/// Runs a cross-field check list, turning any findings into an error.
pub(crate) fn check_invariants(violations: Vec<Violation>) -> Result<(), ValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}
