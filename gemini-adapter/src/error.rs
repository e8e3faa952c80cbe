use thiserror::Error;

/// Errors returned by [`GeminiClient`](crate::GeminiClient).
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Missing credential or malformed setting.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The API answered with a non-success status.
    #[error("Gemini HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The request could not be sent or the response not read.
    #[error("Gemini network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body is not JSON.
    #[error("Gemini returned non-JSON response: {0}")]
    InvalidResponse(String),

    /// The response carries no text part.
    #[error("Gemini response did not include text: {0}")]
    EmptyResponse(String),
}
