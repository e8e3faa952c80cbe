use gemini_adapter::GeminiError;
use interview_core::contracts::ContractError;
use interview_core::pipeline::PipelineError;
use interview_core::schema::SchemaIoError;
use thiserror::Error;

/// Errors surfaced by the binary and its HTTP handlers.
#[derive(Debug, Error)]
pub enum LabError {
    /// Malformed process configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The Gemini client could not be built.
    #[error("Gemini adapter error: {0}")]
    Gemini(#[from] GeminiError),

    /// The request failed input validation.
    #[error("Invalid request: {0}")]
    BadRequest(#[from] ContractError),

    /// The pipeline failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Schema files could not be written or read.
    #[error(transparent)]
    Schema(#[from] SchemaIoError),

    /// No schema document has this name.
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),
}
