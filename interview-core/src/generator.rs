//! The text-generation capability the pipeline drives.
//!
//! The pipeline never sees a concrete provider. Anything that can turn a
//! system prompt and a user prompt into text implements [`TextGenerator`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::contracts::ContractKind;

/// Which half of an attempt a call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The first call of an attempt, built from the request.
    Primary,
    /// The correction call issued after a failed primary.
    Repair,
}

impl Stage {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Repair => "repair",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation tags attached to every call.
///
/// Enough to trace a run attempt by attempt without storing prompt bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMetadata {
    /// Per-invocation correlation id.
    pub request_id: String,
    /// Contract being produced.
    pub target: ContractKind,
    /// 1-based attempt number.
    pub attempt: usize,
    /// Primary or repair.
    pub stage: Stage,
    /// Short content hash of the system prompt.
    pub system_prompt_hash: String,
    /// Short content hash of the user prompt.
    pub payload_hash: String,
    /// Lane fragment used, for question generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane_hint: Option<String>,
    /// Schema name of the target contract.
    pub target_schema_name: &'static str,
    /// Asks providers that support it for JSON-only output.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_only: bool,
}

/// One call to the text-generation capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// System instruction.
    pub system_prompt: String,
    /// User turn.
    pub user_prompt: String,
    /// Sampling temperature; provider default when `None`.
    pub temperature: Option<f32>,
    /// Correlation tags.
    pub metadata: CallMetadata,
}

/// The provider failed to return text: transport, HTTP status, or an empty
/// response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// A provider error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying adapter error, keeping it as the source.
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Something that turns prompts into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs one generation call.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the call fails or yields no text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        (**self).generate(request).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        (**self).generate(request).await
    }
}
