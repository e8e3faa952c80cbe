//! Process configuration for the binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use interview_core::pipeline::PipelineConfig;

use crate::errors::LabError;

/// Prompt fragment root variable.
pub const PROMPTS_DIR_ENV_VAR: &str = "INTERVIEW_PROMPTS_DIR";
/// Attempt bound variable.
pub const MAX_ATTEMPTS_ENV_VAR: &str = "INTERVIEW_MAX_ATTEMPTS";
/// Listen address variable.
pub const BIND_ADDR_ENV_VAR: &str = "INTERVIEW_BIND_ADDR";

/// Settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq)]
pub struct LabConfig {
    /// Root of `common/` and `lanes/` prompt fragments.
    ///
    /// Default: `prompts`
    pub prompts_dir: PathBuf,

    /// Attempts per pipeline invocation.
    ///
    /// Default: 3
    pub max_attempts: usize,

    /// Address the HTTP server listens on.
    ///
    /// Default: `127.0.0.1:8000`
    pub bind_addr: SocketAddr,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            prompts_dir: PathBuf::from("prompts"),
            max_attempts: 3,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

impl LabConfig {
    /// Reads the configuration from the environment, after loading a `.env`
    /// file from the working directory if one exists. Variables already set
    /// in the environment take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Config`] for malformed values.
    pub fn from_env() -> Result<Self, LabError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(event = "dotenv_loaded", path = %path.display(), "dotenv_loaded");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Config`] for malformed values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LabError> {
        let mut config = Self::default();

        if let Some(dir) = lookup(PROMPTS_DIR_ENV_VAR) {
            config.prompts_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(MAX_ATTEMPTS_ENV_VAR) {
            config.max_attempts = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|attempts| *attempts >= 1)
                .ok_or_else(|| {
                    LabError::Config(format!(
                        "{MAX_ATTEMPTS_ENV_VAR} must be an integer >= 1, got {raw:?}"
                    ))
                })?;
        }
        if let Some(raw) = lookup(BIND_ADDR_ENV_VAR) {
            config.bind_addr = raw.trim().parse().map_err(|_| {
                LabError::Config(format!(
                    "{BIND_ADDR_ENV_VAR} must be a socket address, got {raw:?}"
                ))
            })?;
        }
        Ok(config)
    }

    /// Pipeline settings derived from this configuration.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default().with_max_attempts(self.max_attempts)
    }
}
