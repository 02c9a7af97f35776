use std::sync::Arc;

use tracing::info;

use crate::application::SettingsStore;
use crate::domain::{ApiKey, ApiKeyHandle, DomainError};

/// The settings operation: validate, persist, then publish a new API key.
pub struct UpdateApiKeyUseCase {
    store: Arc<dyn SettingsStore>,
    handle: ApiKeyHandle,
}

impl UpdateApiKeyUseCase {
    pub fn new(store: Arc<dyn SettingsStore>, handle: ApiKeyHandle) -> Self {
        Self { store, handle }
    }

    pub async fn execute(&self, raw: &str) -> Result<(), DomainError> {
        let key = ApiKey::new(raw)?;
        self.store.save_api_key(&key).await?;
        self.handle.replace(key);
        info!("API key updated");
        Ok(())
    }

    pub fn handle(&self) -> &ApiKeyHandle {
        &self.handle
    }
}
