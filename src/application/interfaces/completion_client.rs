use async_trait::async_trait;

use crate::domain::{ApiKey, DomainError, Turn};

/// Sends a conversation history to a chat-completion endpoint and returns the
/// generated assistant text.
///
/// Implementors own transport and wire-format details. Every failure is
/// returned as a [`DomainError`] value; nothing here mutates the conversation.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `history` (oldest first, never empty) using `api_key` as the
    /// bearer token.
    async fn complete(&self, history: &[Turn], api_key: &ApiKey) -> Result<String, DomainError>;

    fn model_name(&self) -> &str;
}

/// Precondition shared by all clients: there must be something to complete.
pub fn ensure_history(history: &[Turn]) -> Result<(), DomainError> {
    if history.is_empty() {
        return Err(DomainError::invalid_input(
            "completion history must contain at least one turn",
        ));
    }
    Ok(())
}
