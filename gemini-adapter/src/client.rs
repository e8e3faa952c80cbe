use serde_json::Value;

use crate::config::GeminiConfig;
use crate::error::GeminiError;
use crate::types::{extract_text, GenerateContentRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Calls `generateContent` and returns the response text.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Creates a client; the configured timeout applies to every call.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfig`] when the key is blank and
    /// [`GeminiError::Network`] when the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::InvalidConfig("API key is empty".to_string()));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Creates a client from the process environment.
    ///
    /// # Errors
    ///
    /// See [`GeminiConfig::from_env`] and [`new`](Self::new).
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Runs one single-turn generation.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::Http`] on a non-success status,
    /// [`GeminiError::Network`] on transport failure or timeout,
    /// [`GeminiError::InvalidResponse`] on a non-JSON body, and
    /// [`GeminiError::EmptyResponse`] when no candidate carries text.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, GeminiError> {
        let url = self.config.generate_url();
        let body = GenerateContentRequest::new(system_prompt, user_prompt, temperature);

        tracing::debug!(
            event = "gemini_request",
            model = %self.config.model,
            system_chars = system_prompt.chars().count(),
            user_chars = user_prompt.chars().count(),
            "gemini_request"
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            tracing::warn!(event = "gemini_http_error", status = status.as_u16(), "gemini_http_error");
            return Err(GeminiError::Http {
                status: status.as_u16(),
                body: raw,
            });
        }

        let json: Value =
            serde_json::from_str(&raw).map_err(|e| GeminiError::InvalidResponse(e.to_string()))?;

        extract_text(&json).ok_or_else(|| GeminiError::EmptyResponse(json.to_string()))
    }
}
