//! Error types for contract validation.

use std::fmt;

use thiserror::Error;

use super::rules::{Rule, Violation};

/// The input is not shaped like the contract at all: not an object, or it
/// carries keys the contract does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The value at `path` should have been a JSON object.
    #[error("{path} must be a JSON object, found {found}")]
    NotAnObject {
        /// Location of the offending value (`$` for the root).
        path: String,
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The object at `path` has keys outside the declared field set.
    #[error("unknown field(s) at {path}: {}", keys.join(", "))]
    UnknownFields {
        /// Location of the offending object (`$` for the root).
        path: String,
        /// The undeclared keys, in the order they appeared.
        keys: Vec<String>,
    },
}

/// One or more field-level or cross-field rules were violated.
///
/// Always carries at least one [`Violation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub(crate) const fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// All violations, in the order the rules were checked.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation names `rule` at `path`.
    #[must_use]
    pub fn has(&self, path: &str, rule: Rule) -> bool {
        self.violations
            .iter()
            .any(|v| v.path == path && v.rule == rule)
    }

    /// Whether any violation names `rule`, regardless of path.
    #[must_use]
    pub fn has_rule(&self, rule: Rule) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.violations.len();
        write!(
            f,
            "{count} validation error{}",
            if count == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

/// Why a raw object was rejected by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Structural mismatch, checked before any field rule.
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Field-level or cross-field rule failures.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl ContractError {
    /// The per-field violations, if this is a validation failure.
    #[must_use]
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Shape(_) => None,
            Self::Validation(err) => Some(err.violations()),
        }
    }
}
