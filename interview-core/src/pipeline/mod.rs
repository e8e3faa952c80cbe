//! Generate/validate/repair orchestration over a [`TextGenerator`].
//!
//! - [`InterviewPipeline`] - bounded primary+repair loop
//! - [`PipelineError`] - typed error enum with attempt history
//! - [`PipelineConfig`] - retry and sampling configuration
//! - [`RepairPayload`] - what a repair call is told about the rejected output
//!
//! [`TextGenerator`]: crate::generator::TextGenerator

pub mod config;
pub mod error;
pub mod feedback;
pub mod orchestrator;
pub mod telemetry;

pub use config::PipelineConfig;
pub use error::{AttemptRecord, PipelineError};
pub use feedback::{parse_and_validate, Failure, FailureKind, RepairPayload};
pub use orchestrator::InterviewPipeline;
pub use telemetry::{content_hash, preview, redacted};
