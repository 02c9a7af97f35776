use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::application::{ensure_history, CompletionClient};
use crate::domain::{ApiKey, DomainError, Turn};

/// How [`MockCompletionClient`] answers.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Always return this text.
    Fixed(String),
    /// Repeat the content of the most recent turn.
    Echo,
    /// Fail with an API error carrying this status.
    Fail(u16),
    /// Fail with a transport error carrying this message.
    Unreachable(String),
}

/// In-process completion client for tests and offline use.
///
/// Every history it receives is recorded so callers can inspect what would
/// have been sent over the wire.
pub struct MockCompletionClient {
    reply: MockReply,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl MockCompletionClient {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockReply::Echo)
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn recorded_histories(&self) -> Vec<Vec<Turn>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::echo()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, history: &[Turn], _api_key: &ApiKey) -> Result<String, DomainError> {
        ensure_history(history)?;

        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(history.to_vec());

        debug!("Mock completion for {} turns", history.len());

        match &self.reply {
            MockReply::Fixed(text) => Ok(text.clone()),
            MockReply::Echo => Ok(history
                .last()
                .map(|turn| turn.content().to_string())
                .unwrap_or_default()),
            MockReply::Fail(status) => Err(DomainError::api(*status)),
            MockReply::Unreachable(msg) => Err(DomainError::transport(msg.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-completion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        ApiKey::new("sk-test").unwrap()
    }

    #[tokio::test]
    async fn echo_repeats_last_turn() {
        let client = MockCompletionClient::echo();
        let history = vec![Turn::user("first"), Turn::user("second")];

        let reply = client.complete(&history, &key()).await.unwrap();

        assert_eq!(reply, "second");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_reports_transport_error() {
        let client = MockCompletionClient::new(MockReply::Unreachable("dns failure".into()));

        let err = client
            .complete(&[Turn::user("hi")], &key())
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn empty_history_is_not_recorded() {
        let client = MockCompletionClient::echo();

        assert!(client.complete(&[], &key()).await.is_err());
        assert_eq!(client.call_count(), 0);
    }
}
