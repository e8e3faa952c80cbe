//! Request shapes accepted by the pipeline entry points.
//!
//! Each body is checked against its derived request document, the same one
//! served over HTTP, so a bad request is rejected with per-field diagnostics
//! before any provider call.

use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ContractError;
use super::question::Question;
use super::rules::{check_fields, compile, decode, normalized, CompiledSchema, Rule, Violation};
use super::{Contract, QuestionType, Style, Track, ValidationError};
use crate::schema::Document;

static QUESTION_REQUEST_SCHEMA: LazyLock<CompiledSchema> =
    LazyLock::new(|| compile(&Document::QuestionRequest.render()));

static EVALUATION_REQUEST_SCHEMA: LazyLock<CompiledSchema> =
    LazyLock::new(|| compile(&Document::EvaluationRequest.render()));

/// Inputs for generating one interview question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QuestionRequest {
    track: Track,
    question_type: QuestionType,
    #[schemars(range(min = 1, max = 5))]
    difficulty: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<Style>,
}

#[derive(Deserialize)]
struct QuestionRequestFields {
    track: Track,
    question_type: QuestionType,
    difficulty: u8,
    #[serde(default)]
    style: Option<Style>,
}

impl QuestionRequest {
    /// Builds a request from typed parts.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `difficulty` is outside 1..=5.
    pub fn new(
        track: Track,
        question_type: QuestionType,
        difficulty: u8,
        style: Option<Style>,
    ) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&difficulty) {
            return Err(ValidationError::new(vec![Violation::new(
                "difficulty",
                Rule::Range,
                format!("must be between 1 and 5, got {difficulty}"),
            )]));
        }
        Ok(Self {
            track,
            question_type,
            difficulty,
            style,
        })
    }

    /// Validates an untyped request body.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] on unknown keys or broken field rules.
    pub fn from_value(raw: &Value) -> Result<Self, ContractError> {
        check_fields(&QUESTION_REQUEST_SCHEMA, raw)?;
        let fields: QuestionRequestFields = decode(normalized(raw))?;

        Ok(Self {
            track: fields.track,
            question_type: fields.question_type,
            difficulty: fields.difficulty,
            style: fields.style,
        })
    }

    /// Requested lane.
    #[must_use]
    pub const fn track(&self) -> Track {
        self.track
    }

    /// Requested question mode.
    #[must_use]
    pub const fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Requested difficulty, 1..=5.
    #[must_use]
    pub const fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Requested tone, if any.
    #[must_use]
    pub const fn style(&self) -> Option<Style> {
        self.style
    }
}

/// The question being graded: a validated [`Question`] when the object
/// satisfies the contract, otherwise the caller's object as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuestionPayload {
    /// Validated question contract.
    Typed(Question),
    /// Arbitrary question object.
    Untyped(Map<String, Value>),
}

impl QuestionPayload {
    /// Prefers the validated form when `object` satisfies the contract.
    #[must_use]
    pub fn from_object(object: Map<String, Value>) -> Self {
        Question::from_value(&Value::Object(object.clone()))
            .map_or_else(|_| Self::Untyped(object), Self::Typed)
    }
}

impl From<Question> for QuestionPayload {
    fn from(question: Question) -> Self {
        Self::Typed(question)
    }
}

/// Inputs for grading one candidate answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EvaluationRequest {
    #[schemars(with = "Map<String, Value>")]
    question_json: QuestionPayload,
    #[schemars(length(min = 1), pattern(r"\S"))]
    candidate_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    validator_summary: Option<Map<String, Value>>,
}

/// `question_json` and `validator_summary` are kept exactly as sent.
#[derive(Deserialize)]
struct EvaluationRequestFields {
    question_json: Map<String, Value>,
    candidate_answer: String,
    #[serde(default)]
    validator_summary: Option<Map<String, Value>>,
}

impl EvaluationRequest {
    /// Builds a request from typed parts.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when `candidate_answer` is blank.
    pub fn new(
        question: impl Into<QuestionPayload>,
        candidate_answer: impl Into<String>,
        validator_summary: Option<Map<String, Value>>,
    ) -> Result<Self, ValidationError> {
        let candidate_answer = candidate_answer.into().trim().to_string();
        if candidate_answer.is_empty() {
            return Err(ValidationError::new(vec![Violation::new(
                "candidate_answer",
                Rule::NonEmpty,
                "must not be empty",
            )]));
        }
        Ok(Self {
            question_json: question.into(),
            candidate_answer,
            validator_summary,
        })
    }

    /// Validates an untyped request body.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] on unknown keys or broken field rules.
    pub fn from_value(raw: &Value) -> Result<Self, ContractError> {
        check_fields(&EVALUATION_REQUEST_SCHEMA, raw)?;
        let fields: EvaluationRequestFields = decode(raw.clone())?;

        Ok(Self {
            question_json: QuestionPayload::from_object(fields.question_json),
            candidate_answer: fields.candidate_answer.trim().to_string(),
            validator_summary: fields.validator_summary,
        })
    }

    /// The question being graded.
    #[must_use]
    pub const fn question_json(&self) -> &QuestionPayload {
        &self.question_json
    }

    /// The candidate's answer. Potentially sensitive; never log it.
    #[must_use]
    pub fn candidate_answer(&self) -> &str {
        &self.candidate_answer
    }

    /// Summary from an external validator (e.g. a test runner), if any.
    #[must_use]
    pub const fn validator_summary(&self) -> Option<&Map<String, Value>> {
        self.validator_summary.as_ref()
    }
}
