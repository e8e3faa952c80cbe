//! Published JSON Schema documents.
//!
//! The contract documents are versioned artifacts checked into `schemas/`.
//! They express every field-level rule of the in-process contracts; the
//! cross-field rules have no JSON Schema equivalent and live only in code.

use std::fmt;
use std::path::{Path, PathBuf};

use schemars::schema_for;
use serde_json::{json, Value};
use thiserror::Error;

use crate::contracts::rules::NON_BLANK_PATTERN;
use crate::contracts::{ContractKind, EvaluationRequest, QuestionRequest};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// A string with at least one non-whitespace character.
fn non_blank_string() -> Value {
    json!({"type": "string", "minLength": 1, "pattern": NON_BLANK_PATTERN})
}

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn bounded_string_list(min: usize, max: usize) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "minItems": min,
        "maxItems": max
    })
}

/// Schema document of the question contract, v1.
#[must_use]
pub fn question_schema() -> Value {
    json!({
        "$schema": DRAFT,
        "title": "QuestionJSON",
        "description": "One generated interview question (contract v1).",
        "type": "object",
        "additionalProperties": false,
        "required": [
            "track",
            "question_type",
            "difficulty",
            "question",
            "expected_points",
            "followups",
            "red_flags"
        ],
        "properties": {
            "track": {"type": "string", "enum": ["ai", "backend", "frontend"]},
            "question_type": {"type": "string", "enum": ["theory", "coding"]},
            "difficulty": {"type": "integer", "minimum": 1, "maximum": 5},
            "question": non_blank_string(),
            "expected_points": bounded_string_list(6, 10),
            "followups": bounded_string_list(3, 3),
            "red_flags": bounded_string_list(3, 3),
            "coding": {
                "type": ["object", "null"],
                "additionalProperties": false,
                "required": ["language", "starter_code", "requirements", "tests"],
                "properties": {
                    "language": {"type": "string", "pattern": "^\\s*python\\s*$"},
                    "starter_code": non_blank_string(),
                    "requirements": {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1
                    },
                    "tests": non_blank_string()
                },
                "default": null
            }
        }
    })
}

/// Schema document of the evaluation contract, v1.
#[must_use]
pub fn evaluation_schema() -> Value {
    json!({
        "$schema": DRAFT,
        "title": "EvaluationJSON",
        "description": "Grading of one candidate answer (contract v1).",
        "type": "object",
        "additionalProperties": false,
        "required": [
            "score",
            "strengths",
            "missing_points",
            "incorrect_points",
            "ideal_answer",
            "improvement_tips",
            "clarifying_questions"
        ],
        "properties": {
            "score": {"type": "integer", "minimum": 0, "maximum": 100},
            "strengths": string_list(),
            "missing_points": string_list(),
            "incorrect_points": string_list(),
            "ideal_answer": non_blank_string(),
            "improvement_tips": string_list(),
            "clarifying_questions": {
                "type": "array",
                "items": {"type": "string"},
                "maxItems": 3
            },
            "followup_question": {"type": "string", "default": ""}
        }
    })
}

/// Schema document of the contract selected by `kind`.
#[must_use]
pub fn schema_for(kind: ContractKind) -> Value {
    match kind {
        ContractKind::Question => question_schema(),
        ContractKind::Evaluation => evaluation_schema(),
    }
}

/// File name of the published document for `kind`.
#[must_use]
pub const fn file_name(kind: ContractKind) -> &'static str {
    match kind {
        ContractKind::Question => "question.v1.json",
        ContractKind::Evaluation => "evaluation.v1.json",
    }
}

/// Every document that can be served by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    /// [`question_schema`].
    Question,
    /// [`evaluation_schema`].
    Evaluation,
    /// Derived schema of [`QuestionRequest`].
    QuestionRequest,
    /// Derived schema of [`EvaluationRequest`].
    EvaluationRequest,
}

impl Document {
    /// All documents, in listing order.
    pub const ALL: [Self; 4] = [
        Self::Question,
        Self::Evaluation,
        Self::QuestionRequest,
        Self::EvaluationRequest,
    ];

    /// URL-safe name.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Evaluation => "evaluation",
            Self::QuestionRequest => "question-request",
            Self::EvaluationRequest => "evaluation-request",
        }
    }

    /// Looks a document up by slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|doc| doc.slug() == slug)
    }

    /// The document body.
    #[must_use]
    pub fn render(self) -> Value {
        match self {
            Self::Question => question_schema(),
            Self::Evaluation => evaluation_schema(),
            Self::QuestionRequest => json!(schema_for!(QuestionRequest)),
            Self::EvaluationRequest => json!(schema_for!(EvaluationRequest)),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Failures writing or reading schema files.
#[derive(Debug, Error)]
#[error("schema file {}: {source}", path.display())]
pub struct SchemaIoError {
    /// File involved.
    pub path: PathBuf,
    /// Underlying error.
    #[source]
    pub source: std::io::Error,
}

/// Pretty-printed document text as stored on disk.
#[must_use]
pub fn render_file(kind: ContractKind) -> String {
    let schema = schema_for(kind);
    let mut text = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());
    text.push('\n');
    text
}

/// Writes both contract documents into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`SchemaIoError`] when the directory or a file cannot be written.
pub fn export_schemas(dir: &Path) -> Result<Vec<PathBuf>, SchemaIoError> {
    std::fs::create_dir_all(dir).map_err(|source| SchemaIoError {
        path: dir.to_path_buf(),
        source,
    })?;

    [ContractKind::Question, ContractKind::Evaluation]
        .into_iter()
        .map(|kind| {
            let path = dir.join(file_name(kind));
            std::fs::write(&path, render_file(kind)).map_err(|source| SchemaIoError {
                path: path.clone(),
                source,
            })?;
            tracing::info!(event = "schema_exported", path = %path.display(), "schema_exported");
            Ok(path)
        })
        .collect()
}

/// How a file on disk disagrees with its in-process document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// The file does not exist.
    Missing,
    /// The file is not valid JSON.
    Unparseable(String),
    /// The file parses but describes different rules.
    Differs,
}

/// One out-of-date schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDrift {
    /// Contract whose document drifted.
    pub kind: ContractKind,
    /// File checked.
    pub path: PathBuf,
    /// What is wrong with it.
    pub drift: Drift,
}

impl fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.drift {
            Drift::Missing => write!(f, "{path}: missing"),
            Drift::Unparseable(err) => write!(f, "{path}: not valid JSON ({err})"),
            Drift::Differs => write!(f, "{path}: out of date with the {} contract", self.kind),
        }
    }
}

/// Compares the documents in `dir` with the in-process ones.
///
/// Documents are compared as JSON values, so formatting and key order do not
/// count as drift.
///
/// # Errors
///
/// Returns [`SchemaIoError`] when a file exists but cannot be read.
pub fn check_schemas(dir: &Path) -> Result<Vec<SchemaDrift>, SchemaIoError> {
    let mut drifted = Vec::new();
    for kind in [ContractKind::Question, ContractKind::Evaluation] {
        let path = dir.join(file_name(kind));
        let drift = match std::fs::read_to_string(&path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Some(Drift::Missing),
            Err(source) => return Err(SchemaIoError { path, source }),
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Err(err) => Some(Drift::Unparseable(err.to_string())),
                Ok(on_disk) if on_disk != schema_for(kind) => Some(Drift::Differs),
                Ok(_) => None,
            },
        };
        if let Some(drift) = drift {
            drifted.push(SchemaDrift { kind, path, drift });
        }
    }
    Ok(drifted)
}

/// Checks `instance` against the published document of `kind`.
///
/// Returns every schema violation as `"At path '<pointer>': <message>"`.
#[must_use]
pub fn schema_violations(kind: ContractKind, instance: &Value) -> Vec<String> {
    match jsonschema::Validator::new(&schema_for(kind)) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|error| format!("At path '{}': {}", error.instance_path, error))
            .collect(),
        Err(e) => vec![format!("Schema compilation error: {e}")],
    }
}
