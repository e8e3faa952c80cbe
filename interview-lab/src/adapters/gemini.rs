use async_trait::async_trait;
use gemini_adapter::{GeminiClient, GeminiError};
use interview_core::generator::{GenerationRequest, ProviderError, TextGenerator};
use tracing::Instrument;

/// The pipeline's [`TextGenerator`] backed by Gemini.
///
/// Call metadata is not sent upstream; it only tags the tracing span of the
/// call.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    /// The underlying REST client.
    pub client: GeminiClient,
}

impl GeminiGenerator {
    /// Wraps an existing client.
    #[must_use]
    pub const fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Builds the client from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfig`] on a missing key or malformed
    /// setting.
    pub fn from_env() -> Result<Self, GeminiError> {
        GeminiClient::from_env().map(Self::new)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let metadata = &request.metadata;
        let span = tracing::debug_span!(
            "gemini_call",
            request_id = %metadata.request_id,
            target = %metadata.target,
            attempt = metadata.attempt,
            stage = %metadata.stage,
            system_prompt_hash = %metadata.system_prompt_hash,
            payload_hash = %metadata.payload_hash,
            json_only = metadata.json_only,
        );

        self.client
            .generate(&request.system_prompt, &request.user_prompt, request.temperature)
            .instrument(span)
            .await
            .map_err(ProviderError::from_source)
    }
}
