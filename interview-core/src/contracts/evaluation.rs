//! The answer evaluation contract.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ContractError;
use super::rules::{
    check_fields, check_invariants, compile, decode, normalized, CompiledSchema, Rule, Violation,
};
use super::{Contract, ContractKind};
use crate::schema::evaluation_schema;

static EVALUATION_SCHEMA: LazyLock<CompiledSchema> =
    LazyLock::new(|| compile(&evaluation_schema()));

/// Highest score allowed while clarifying questions are outstanding.
pub const CLARIFICATION_SCORE_CAP: u8 = 60;

/// Scores at or above this need no followup question.
pub const FOLLOWUP_THRESHOLD: u8 = 85;

/// Grading of one candidate answer (contract v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Evaluation {
    score: u8,
    strengths: Vec<String>,
    missing_points: Vec<String>,
    incorrect_points: Vec<String>,
    ideal_answer: String,
    improvement_tips: Vec<String>,
    clarifying_questions: Vec<String>,
    followup_question: String,
}

#[derive(Deserialize)]
struct EvaluationFields {
    score: u8,
    strengths: Vec<String>,
    missing_points: Vec<String>,
    incorrect_points: Vec<String>,
    ideal_answer: String,
    improvement_tips: Vec<String>,
    clarifying_questions: Vec<String>,
    #[serde(default)]
    followup_question: String,
}

impl Evaluation {
    /// Normalized score, 0..=100.
    #[must_use]
    pub const fn score(&self) -> u8 {
        self.score
    }

    /// What the answer did well.
    #[must_use]
    pub fn strengths(&self) -> &[String] {
        &self.strengths
    }

    /// Rubric points the answer left out.
    #[must_use]
    pub fn missing_points(&self) -> &[String] {
        &self.missing_points
    }

    /// Statements in the answer that are wrong.
    #[must_use]
    pub fn incorrect_points(&self) -> &[String] {
        &self.incorrect_points
    }

    /// Compact reference answer.
    #[must_use]
    pub fn ideal_answer(&self) -> &str {
        &self.ideal_answer
    }

    /// Concrete next steps for the candidate.
    #[must_use]
    pub fn improvement_tips(&self) -> &[String] {
        &self.improvement_tips
    }

    /// Questions the grader needs answered before grading fairly (at most 3).
    #[must_use]
    pub fn clarifying_questions(&self) -> &[String] {
        &self.clarifying_questions
    }

    /// Depth probe; empty when none is asked.
    #[must_use]
    pub fn followup_question(&self) -> &str {
        &self.followup_question
    }

    /// Clarifications first; only without them does the followup/score
    /// threshold apply.
    fn invariant_violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let has_followup = !self.followup_question.is_empty();

        if !self.clarifying_questions.is_empty() {
            if has_followup {
                violations.push(Violation::new(
                    "followup_question",
                    Rule::ClarificationPolicy,
                    "followup_question must be empty when clarifying_questions are present",
                ));
            }
            if self.score > CLARIFICATION_SCORE_CAP {
                violations.push(Violation::new(
                    "score",
                    Rule::ClarificationPolicy,
                    format!(
                        "score must be <= {CLARIFICATION_SCORE_CAP} when clarifying_questions are present, got {}",
                        self.score
                    ),
                ));
            }
            return violations;
        }

        if self.score < FOLLOWUP_THRESHOLD && !has_followup {
            violations.push(Violation::new(
                "followup_question",
                Rule::FollowupPolicy,
                format!("followup_question is required when score is below {FOLLOWUP_THRESHOLD}"),
            ));
        }
        if self.score >= FOLLOWUP_THRESHOLD && has_followup {
            violations.push(Violation::new(
                "followup_question",
                Rule::FollowupPolicy,
                format!("followup_question must be empty when score is {FOLLOWUP_THRESHOLD} or above"),
            ));
        }
        violations
    }
}

impl Contract for Evaluation {
    const KIND: ContractKind = ContractKind::Evaluation;

    fn from_value(raw: &Value) -> Result<Self, ContractError> {
        check_fields(&EVALUATION_SCHEMA, raw)?;
        let fields: EvaluationFields = decode(normalized(raw))?;

        let evaluation = Self {
            score: fields.score,
            strengths: fields.strengths,
            missing_points: fields.missing_points,
            incorrect_points: fields.incorrect_points,
            ideal_answer: fields.ideal_answer,
            improvement_tips: fields.improvement_tips,
            clarifying_questions: fields.clarifying_questions,
            followup_question: fields.followup_question,
        };

        check_invariants(evaluation.invariant_violations())?;
        Ok(evaluation)
    }
}

impl TryFrom<Value> for Evaluation {
    type Error = ContractError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}
