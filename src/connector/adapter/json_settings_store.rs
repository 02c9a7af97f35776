use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use crate::application::SettingsStore;
use crate::connector::AppConfig;
use crate::domain::{ApiKey, DomainError};

/// [`SettingsStore`] backed by the JSON config file.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The current file as a raw JSON object, so fields this version does not
    /// know about survive a rewrite.
    async fn read_existing(&self) -> Result<Map<String, Value>, DomainError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            DomainError::config(format!("invalid JSON in {}: {e}", self.path.display()))
        })?;
        match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(DomainError::config(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load_api_key(&self) -> Result<ApiKey, DomainError> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || AppConfig::load(&path))
            .await
            .map_err(|e| DomainError::config(format!("settings task failed: {e}")))??;
        config.api_key()
    }

    async fn save_api_key(&self, key: &ApiKey) -> Result<(), DomainError> {
        let mut fields = self.read_existing().await?;
        fields.insert(
            "api_key".to_string(),
            Value::String(key.expose().to_string()),
        );

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&fields)
            .map_err(|e| DomainError::config(format!("cannot serialize settings: {e}")))?;
        tokio::fs::write(&self.path, content).await?;

        info!("Saved API key to {}", self.path.display());
        Ok(())
    }
}
