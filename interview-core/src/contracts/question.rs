//! The generated interview question contract.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ContractError;
use super::rules::{
    check_fields, check_invariants, compile, decode, normalized, CompiledSchema, Rule, Violation,
};
use super::{Contract, ContractKind, QuestionType, Track};
use crate::schema::question_schema;

static QUESTION_SCHEMA: LazyLock<CompiledSchema> = LazyLock::new(|| compile(&question_schema()));

/// Programming language of a coding exercise. Only Python is supported in v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodingLanguage {
    /// Python.
    Python,
}

/// Coding material attached to a `coding` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodingPayload {
    language: CodingLanguage,
    starter_code: String,
    requirements: Vec<String>,
    tests: String,
}

impl CodingPayload {
    /// Exercise language.
    #[must_use]
    pub const fn language(&self) -> CodingLanguage {
        self.language
    }

    /// Code the candidate starts from.
    #[must_use]
    pub fn starter_code(&self) -> &str {
        &self.starter_code
    }

    /// Acceptance criteria, in order.
    #[must_use]
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Test source aligned with the starter signature.
    #[must_use]
    pub fn tests(&self) -> &str {
        &self.tests
    }
}

/// Decoded form of an input that already passed the field rules.
#[derive(Deserialize)]
struct QuestionFields {
    track: Track,
    question_type: QuestionType,
    difficulty: u8,
    question: String,
    expected_points: Vec<String>,
    followups: Vec<String>,
    red_flags: Vec<String>,
    #[serde(default)]
    coding: Option<CodingFields>,
}

#[derive(Deserialize)]
struct CodingFields {
    language: CodingLanguage,
    starter_code: String,
    requirements: Vec<String>,
    tests: String,
}

impl From<CodingFields> for CodingPayload {
    fn from(fields: CodingFields) -> Self {
        Self {
            language: fields.language,
            starter_code: fields.starter_code,
            requirements: fields.requirements,
            tests: fields.tests,
        }
    }
}

/// One generated interview question (contract v1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Question {
    track: Track,
    question_type: QuestionType,
    difficulty: u8,
    question: String,
    expected_points: Vec<String>,
    followups: Vec<String>,
    red_flags: Vec<String>,
    coding: Option<CodingPayload>,
}

impl Question {
    /// Interview lane.
    #[must_use]
    pub const fn track(&self) -> Track {
        self.track
    }

    /// Theory or coding.
    #[must_use]
    pub const fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Difficulty on the 1..=5 scale.
    #[must_use]
    pub const fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// The question text.
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Rubric points a good answer covers (6 to 10).
    #[must_use]
    pub fn expected_points(&self) -> &[String] {
        &self.expected_points
    }

    /// Exactly three follow-up probes.
    #[must_use]
    pub fn followups(&self) -> &[String] {
        &self.followups
    }

    /// Exactly three common misconceptions.
    #[must_use]
    pub fn red_flags(&self) -> &[String] {
        &self.red_flags
    }

    /// Coding material; present iff the question is a coding question.
    #[must_use]
    pub const fn coding(&self) -> Option<&CodingPayload> {
        self.coding.as_ref()
    }

    fn invariant_violations(&self) -> Vec<Violation> {
        match (self.question_type, &self.coding) {
            (QuestionType::Theory, Some(_)) => vec![Violation::new(
                "coding",
                Rule::CodingMatchesQuestionType,
                "coding must be null for theory questions",
            )],
            (QuestionType::Coding, None) => vec![Violation::new(
                "coding",
                Rule::CodingMatchesQuestionType,
                "coding must be provided for coding questions",
            )],
            _ => Vec::new(),
        }
    }
}

impl Contract for Question {
    const KIND: ContractKind = ContractKind::Question;

    fn from_value(raw: &Value) -> Result<Self, ContractError> {
        check_fields(&QUESTION_SCHEMA, raw)?;
        let fields: QuestionFields = decode(normalized(raw))?;

        let question = Self {
            track: fields.track,
            question_type: fields.question_type,
            difficulty: fields.difficulty,
            question: fields.question,
            expected_points: fields.expected_points,
            followups: fields.followups,
            red_flags: fields.red_flags,
            coding: fields.coding.map(CodingPayload::from),
        };

        check_invariants(question.invariant_violations())?;
        Ok(question)
    }
}

impl TryFrom<Value> for Question {
    type Error = ContractError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ShapeError;
    use serde_json::json;

    fn coding_payload() -> Value {
        json!({
            "language": "python",
            "starter_code": "def solve(nums):\n    pass",
            "requirements": ["must run in O(n)"],
            "tests": "def test_solve():\n    assert solve([1]) == 1"
        })
    }

    fn question_payload(question_type: &str, coding: Value) -> Value {
        json!({
            "track": "ai",
            "question_type": question_type,
            "difficulty": 3,
            "question": "Explain bias-variance trade-offs in production systems.",
            "expected_points": ["p1", "p2", "p3", "p4", "p5", "p6"],
            "followups": ["f1", "f2", "f3"],
            "red_flags": ["r1", "r2", "r3"],
            "coding": coding
        })
    }

    #[test]
    fn test_theory_question_without_coding_passes() {
        let question = Question::from_value(&question_payload("theory", Value::Null)).unwrap();
        assert_eq!(question.track(), Track::Ai);
        assert_eq!(question.difficulty(), 3);
        assert!(question.coding().is_none());
    }

    #[test]
    fn test_coding_key_may_be_omitted() {
        let mut payload = question_payload("theory", Value::Null);
        payload.as_object_mut().unwrap().remove("coding");
        assert!(Question::from_value(&payload).is_ok());
    }

    #[test]
    fn test_theory_question_with_coding_fails() {
        let err = Question::from_value(&question_payload("theory", coding_payload())).unwrap_err();
        let ContractError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(err.has("coding", Rule::CodingMatchesQuestionType));
    }

    #[test]
    fn test_coding_question_requires_coding() {
        let err = Question::from_value(&question_payload("coding", Value::Null)).unwrap_err();
        let ContractError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(err.violations().len(), 1);
        assert!(err.has("coding", Rule::CodingMatchesQuestionType));
    }

    #[test]
    fn test_coding_question_with_coding_passes() {
        let question = Question::from_value(&question_payload("coding", coding_payload())).unwrap();
        let coding = question.coding().unwrap();
        assert_eq!(coding.language(), CodingLanguage::Python);
        assert_eq!(coding.requirements(), ["must run in O(n)"]);
    }

    #[test]
    fn test_cross_field_rule_waits_for_field_rules() {
        // theory + coding would break the cross-field rule, but the bad
        // difficulty must be the only thing reported.
        let mut payload = question_payload("theory", coding_payload());
        payload["difficulty"] = json!(9);

        let err = Question::from_value(&payload).unwrap_err();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "difficulty");
        assert_eq!(violations[0].rule, Rule::Range);
    }

    #[test]
    fn test_nested_coding_rules_report_prefixed_paths() {
        let coding = json!({
            "language": "rust",
            "starter_code": "   ",
            "requirements": [],
            "tests": "def test(): pass"
        });
        let err = Question::from_value(&question_payload("coding", coding)).unwrap_err();
        let ContractError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(err.has("coding.language", Rule::Pattern));
        assert!(err.has("coding.starter_code", Rule::NonEmpty));
        assert!(err.has("coding.requirements", Rule::MinItems));
    }

    #[test]
    fn test_unknown_nested_key_is_shape_error() {
        let mut coding = coding_payload();
        coding["runtime"] = json!("3.12");
        let err = Question::from_value(&question_payload("coding", coding)).unwrap_err();
        assert!(matches!(err, ContractError::Shape(ShapeError::UnknownFields { ref path, .. }) if path == "coding"));
    }

    #[test]
    fn test_expected_points_bounds() {
        let mut payload = question_payload("theory", Value::Null);
        payload["expected_points"] = json!(["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"]);
        let err = Question::from_value(&payload).unwrap_err();
        assert!(matches!(err, ContractError::Validation(ref e) if e.has("expected_points", Rule::MaxItems)));
    }

    #[test]
    fn test_strings_are_trimmed() {
        let mut payload = question_payload("coding", coding_payload());
        payload["question"] = json!("  What is a p-value?\n");
        payload["coding"]["language"] = json!(" python ");
        let question = Question::from_value(&payload).unwrap();
        assert_eq!(question.question(), "What is a p-value?");
        assert_eq!(question.coding().unwrap().language(), CodingLanguage::Python);
    }

    #[test]
    fn test_enum_values_must_match_exactly() {
        let mut payload = question_payload("theory", Value::Null);
        payload["track"] = json!(" backend ");
        payload["question_type"] = json!("Theory");
        let err = Question::from_value(&payload).unwrap_err();
        let ContractError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(err.has("track", Rule::Enum));
        assert!(err.has("question_type", Rule::Enum));
    }

    #[test]
    fn test_integral_float_difficulty_is_accepted() {
        let mut payload = question_payload("theory", Value::Null);
        payload["difficulty"] = json!(4.0);
        assert_eq!(Question::from_value(&payload).unwrap().difficulty(), 4);

        payload["difficulty"] = json!(true);
        let err = Question::from_value(&payload).unwrap_err();
        assert!(matches!(err, ContractError::Validation(ref e) if e.has("difficulty", Rule::Type)));
    }

    #[test]
    fn test_serializes_null_coding() {
        let question = Question::from_value(&question_payload("theory", Value::Null)).unwrap();
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["coding"], Value::Null);
        assert_eq!(value["track"], "ai");
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let bad = question_payload("coding", Value::Null).to_string();
        assert!(serde_json::from_str::<Question>(&bad).is_err());

        let good = question_payload("coding", coding_payload()).to_string();
        let question: Question = serde_json::from_str(&good).unwrap();
        assert_eq!(question.question_type(), QuestionType::Coding);
    }
}
