//! Configuration for the generate/repair loop.

/// Retry and sampling settings for [`InterviewPipeline`](super::InterviewPipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum number of primary+repair attempts (default: 3, must be >= 1).
    pub max_attempts: usize,
    /// Sampling temperature of primary calls (default: 0.2).
    pub primary_temperature: f32,
    /// Sampling temperature of repair calls (default: 0.0).
    pub repair_temperature: f32,
    /// Raw output is logged up to this many characters (default: 2000).
    pub max_output_preview_chars: usize,
    /// Embed the published schema document in repair payloads (default: false).
    pub include_json_schema_in_repair: bool,
    /// Tag calls as JSON-only for providers that honor it (default: true).
    pub request_json_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            primary_temperature: 0.2,
            repair_temperature: 0.0,
            max_output_preview_chars: 2000,
            include_json_schema_in_repair: false,
            request_json_only: true,
        }
    }
}

impl PipelineConfig {
    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the primary and repair temperatures.
    #[must_use]
    pub const fn with_temperatures(mut self, primary: f32, repair: f32) -> Self {
        self.primary_temperature = primary;
        self.repair_temperature = repair;
        self
    }

    /// Set the raw output preview length.
    #[must_use]
    pub const fn with_output_preview_chars(mut self, chars: usize) -> Self {
        self.max_output_preview_chars = chars;
        self
    }

    /// Set whether repair payloads carry the target's schema document.
    #[must_use]
    pub const fn with_schema_in_repair(mut self, include: bool) -> Self {
        self.include_json_schema_in_repair = include;
        self
    }

    /// Set whether calls are tagged JSON-only.
    #[must_use]
    pub const fn with_json_only(mut self, json_only: bool) -> Self {
        self.request_json_only = json_only;
        self
    }
}
