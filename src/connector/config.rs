use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::connector::adapter::{DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::domain::{ApiKey, DomainError};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Contents of `config.json` in the data directory.
///
/// `api_key` is required to chat; the endpoint overrides fall back to the
/// OpenAI defaults when absent.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl AppConfig {
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Read and parse the config file. Any failure is a configuration error.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: AppConfig = serde_json::from_str(&raw).map_err(|e| {
            DomainError::config(format!("invalid JSON in {}: {e}", path.display()))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The configured key, or a configuration error when it is missing.
    pub fn api_key(&self) -> Result<ApiKey, DomainError> {
        ApiKey::new(self.api_key.as_str())
            .map_err(|_| DomainError::config("no API key configured (run `chattyio set-key <KEY>`)"))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
