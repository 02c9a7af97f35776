use std::sync::{Arc, RwLock};

use crate::domain::DomainError;

/// Bearer token for the completion endpoint. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw: String = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input("API key must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Shared holder for the current API key.
///
/// Loaded once at startup, replaced by the settings operation, and read each
/// time a turn is submitted.
#[derive(Debug, Clone)]
pub struct ApiKeyHandle {
    inner: Arc<RwLock<ApiKey>>,
}

impl ApiKeyHandle {
    pub fn new(key: ApiKey) -> Self {
        Self {
            inner: Arc::new(RwLock::new(key)),
        }
    }

    pub fn current(&self) -> ApiKey {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace(&self, key: ApiKey) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_key() {
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("   \n").is_err());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let key = ApiKey::new("  sk-abc \n").unwrap();
        assert_eq!(key.expose(), "sk-abc");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = ApiKey::new("sk-secret").unwrap();
        assert!(!format!("{:?}", key).contains("sk-secret"));
    }

    #[test]
    fn test_handle_replace_is_visible_to_clones() {
        let handle = ApiKeyHandle::new(ApiKey::new("old").unwrap());
        let clone = handle.clone();

        handle.replace(ApiKey::new("new").unwrap());

        assert_eq!(clone.current().expose(), "new");
    }
}
