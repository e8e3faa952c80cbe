//! Strictly validated contract shapes for generated questions and evaluations.
//!
//! Every contract is built from an untyped JSON object in three layers:
//!
//! 1. Shape: the input must be an object with no undeclared keys.
//! 2. Field rules: the published schema document of the contract, run over
//!    the input as received. Every failure is reported. Enumerated values
//!    must match exactly; other strings are trimmed once the rules pass.
//! 3. Cross-field rules: business policy, only evaluated once layer 2 is clean.

pub mod error;
pub mod evaluation;
pub mod question;
pub mod request;
pub mod rules;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::{ContractError, ShapeError, ValidationError};
pub use evaluation::Evaluation;
pub use question::{CodingLanguage, CodingPayload, Question};
pub use request::{EvaluationRequest, QuestionPayload, QuestionRequest};
pub use rules::{Rule, Violation};

/// Interview lane taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Machine learning and applied AI.
    Ai,
    /// Server-side engineering.
    Backend,
    /// Client-side engineering.
    Frontend,
}

impl Track {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question mode; decides whether a coding payload must be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Conceptual question, no coding payload.
    Theory,
    /// Hands-on exercise with a coding payload.
    Coding,
}

impl QuestionType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Coding => "coding",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tone requested for a generated question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Formal, exacting tone.
    Strict,
    /// Encouraging tone.
    Friendly,
}

impl Style {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Friendly => "friendly",
        }
    }
}

/// Which contract a pipeline run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// [`Question`].
    Question,
    /// [`Evaluation`].
    Evaluation,
}

impl ContractKind {
    /// Target name used in logs and errors.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Evaluation => "evaluation",
        }
    }

    /// Schema name handed to the repair stage.
    #[must_use]
    pub const fn schema_name(self) -> &'static str {
        match self {
            Self::Question => "QuestionJSON",
            Self::Evaluation => "EvaluationJSON",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// A shape that can only be obtained by passing validation.
pub trait Contract: Sized + Serialize + Send + 'static {
    /// Which contract this is.
    const KIND: ContractKind;

    /// Validates an untyped JSON value into the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Shape`] when `raw` is not an object or has
    /// undeclared keys, and [`ContractError::Validation`] listing every broken
    /// field-level rule, or every broken cross-field rule once fields are clean.
    fn from_value(raw: &Value) -> Result<Self, ContractError>;
}

/// Output of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidatedContract {
    /// A validated question.
    Question(Question),
    /// A validated evaluation.
    Evaluation(Evaluation),
}

/// Validates `raw` against the contract selected by `kind`.
///
/// # Errors
///
/// See [`Contract::from_value`].
pub fn validate(kind: ContractKind, raw: &Value) -> Result<ValidatedContract, ContractError> {
    match kind {
        ContractKind::Question => Question::from_value(raw).map(ValidatedContract::Question),
        ContractKind::Evaluation => Evaluation::from_value(raw).map(ValidatedContract::Evaluation),
    }
}
