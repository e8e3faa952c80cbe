//! Pipeline errors with attempt history.

use std::time::Duration;

use thiserror::Error;

use super::feedback::FailureKind;
use crate::contracts::ContractKind;
use crate::generator::{ProviderError, Stage};
use crate::prompts::PromptError;

/// One failed stage of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// The attempt number (1-indexed).
    pub attempt: usize,
    /// Which call of the attempt failed.
    pub stage: Stage,
    /// Why its output was rejected.
    pub failure_kind: FailureKind,
    /// Human-readable failure.
    pub message: String,
    /// Time since the invocation started.
    pub elapsed: Duration,
}

/// Errors raised by [`InterviewPipeline`](super::InterviewPipeline).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pipeline was configured with values it cannot run with.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// A prompt fragment could not be loaded.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The text-generation call itself failed.
    #[error("{target} {stage} call failed at attempt {attempt}: {source}")]
    Provider {
        /// Contract being produced.
        target: ContractKind,
        /// Attempt that issued the call.
        attempt: usize,
        /// Stage that issued the call.
        stage: Stage,
        /// Provider failure.
        #[source]
        source: ProviderError,
    },

    /// Every attempt produced unusable output.
    #[error("{target} generation failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Contract being produced.
        target: ContractKind,
        /// Attempts made.
        attempts: usize,
        /// Failure message of the final repair.
        last_error: String,
        /// One record per failed stage, in order.
        history: Vec<AttemptRecord>,
    },
}

impl PipelineError {
    /// Whether the failure lies with the upstream provider rather than with
    /// local setup.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Exhausted { .. })
    }
}
