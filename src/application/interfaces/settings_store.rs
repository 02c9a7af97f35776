use async_trait::async_trait;

use crate::domain::{ApiKey, DomainError};

/// Persistent per-user settings. Only the API key survives between sessions.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the stored key. A missing or blank key is a configuration error.
    async fn load_api_key(&self) -> Result<ApiKey, DomainError>;

    /// Persist `key`, leaving any other stored settings untouched.
    async fn save_api_key(&self, key: &ApiKey) -> Result<(), DomainError>;
}
