//! Contract-first interview question generation and answer grading.
//!
//! A [`TextGenerator`](generator::TextGenerator) produces free text; the
//! [`InterviewPipeline`](pipeline::InterviewPipeline) extracts a JSON object
//! from it, validates it against a strict contract, and asks for a repair when
//! validation fails, within a bounded number of attempts.

pub mod contracts;
pub mod extract;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod schema;

/// Common traits and types for ergonomic usage of the pipeline.
pub mod prelude {
    pub use crate::contracts::{
        validate, Contract, ContractError, ContractKind, Evaluation, EvaluationRequest, Question,
        QuestionRequest, QuestionType, Style, Track,
    };
    pub use crate::generator::{GenerationRequest, ProviderError, TextGenerator};
    pub use crate::pipeline::{InterviewPipeline, PipelineConfig, PipelineError};
    pub use crate::prompts::{FsPromptStore, PromptStore};
}
