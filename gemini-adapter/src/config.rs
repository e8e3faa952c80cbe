//! Configuration for the Gemini client.

use std::fmt;
use std::time::Duration;

use crate::error::GeminiError;

/// Preferred API key variable.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
/// Fallback API key variable.
pub const FALLBACK_API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";
/// Model override variable.
pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
/// API version override variable.
pub const API_VERSION_ENV_VAR: &str = "GEMINI_API_VERSION";
/// API base URL override variable.
pub const API_BASE_ENV_VAR: &str = "GEMINI_API_BASE";
/// Per-call timeout variable, in seconds.
pub const TIMEOUT_ENV_VAR: &str = "GEMINI_TIMEOUT_SECONDS";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v1beta";
/// Public Gemini endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach Gemini.
#[derive(Clone, PartialEq)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: String,
    /// Model name, with or without a `models/` prefix.
    pub model: String,
    /// API version path segment.
    pub api_version: String,
    /// Base URL.
    pub api_base: String,
    /// Timeout of one HTTP call.
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfig`] when no API key is set or the
    /// timeout is not a positive number.
    pub fn from_env() -> Result<Self, GeminiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GeminiError> {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = non_empty(API_KEY_ENV_VAR)
            .or_else(|| non_empty(FALLBACK_API_KEY_ENV_VAR))
            .ok_or_else(|| {
                GeminiError::InvalidConfig(format!(
                    "missing API key; set {API_KEY_ENV_VAR} (or {FALLBACK_API_KEY_ENV_VAR})"
                ))
            })?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_empty(MODEL_ENV_VAR) {
            config.model = model;
        }
        if let Some(version) = non_empty(API_VERSION_ENV_VAR) {
            config.api_version = version;
        }
        if let Some(base) = non_empty(API_BASE_ENV_VAR) {
            config.api_base = base;
        }
        if let Some(raw) = non_empty(TIMEOUT_ENV_VAR) {
            config.timeout = parse_timeout(&raw)?;
        }
        Ok(config)
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full `generateContent` URL for the configured model.
    #[must_use]
    pub fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{base}/{}/models/{model}:generateContent", self.api_version)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, GeminiError> {
    let seconds: f64 = raw.trim().parse().map_err(|_| {
        GeminiError::InvalidConfig(format!("{TIMEOUT_ENV_VAR} must be numeric, got {raw:?}"))
    })?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(GeminiError::InvalidConfig(format!(
            "{TIMEOUT_ENV_VAR} must be positive, got {raw:?}"
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        GeminiError::InvalidConfig(format!("{TIMEOUT_ENV_VAR} is out of range, got {raw:?}"))
    })
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GeminiConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(
            config.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_google_key_is_fallback() {
        let config = GeminiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", ""),
            ("GOOGLE_API_KEY", "google"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "google");

        let config = GeminiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "gemini"),
            ("GOOGLE_API_KEY", "google"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "gemini");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = GeminiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, GeminiError::InvalidConfig(_)));
    }

    #[test]
    fn test_timeout_must_be_positive_number() {
        for raw in ["soon", "0", "-5", "NaN", "inf", "1e30"] {
            let err = GeminiConfig::from_lookup(lookup(&[
                ("GEMINI_API_KEY", "k"),
                ("GEMINI_TIMEOUT_SECONDS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, GeminiError::InvalidConfig(_)), "{raw}");
        }

        let config = GeminiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_TIMEOUT_SECONDS", "2.5"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_url_normalization() {
        let config = GeminiConfig::new("k")
            .with_model("models/gemini-pro")
            .with_api_base("http://localhost:9000/");
        assert_eq!(
            config.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", GeminiConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
