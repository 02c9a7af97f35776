use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::application::CompletionClient;
use crate::domain::{ApiKey, ApiKeyHandle, Conversation, DomainError, Turn};

/// A submitted user turn whose completion has not been applied yet.
///
/// Owns a snapshot of the full history and the API key read at submission
/// time, so it can be moved into a spawned task.
#[derive(Debug)]
pub struct PendingTurn {
    history: Vec<Turn>,
    api_key: ApiKey,
}

impl PendingTurn {
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Run the completion call for this turn.
    pub async fn send(self, client: &dyn CompletionClient) -> Result<String, DomainError> {
        let start_time = Instant::now();
        let result = client.complete(&self.history, &self.api_key).await;
        debug!(
            "Completion for {} turns finished in {:.2}s",
            self.history.len(),
            start_time.elapsed().as_secs_f64()
        );
        result
    }
}

/// Owns the conversation and drives it through Idle and AwaitingResponse.
///
/// Submitting appends the user turn synchronously and hands back a
/// [`PendingTurn`]; the caller runs it (inline or on a task) and feeds the
/// outcome to [`TurnOrchestrator::resolve`]. At most one turn is pending.
pub struct TurnOrchestrator {
    client: Arc<dyn CompletionClient>,
    api_key: ApiKeyHandle,
    conversation: Conversation,
    awaiting_response: bool,
}

impl TurnOrchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, api_key: ApiKeyHandle) -> Self {
        Self {
            client,
            api_key,
            conversation: Conversation::new(),
            awaiting_response: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    pub fn client(&self) -> Arc<dyn CompletionClient> {
        Arc::clone(&self.client)
    }

    pub fn api_key(&self) -> &ApiKeyHandle {
        &self.api_key
    }

    /// Append `input` as a user turn and prepare the completion call.
    ///
    /// Blank input returns `Ok(None)` and changes nothing. A second submission
    /// while a turn is pending is rejected with [`DomainError::Busy`].
    pub fn begin_turn(&mut self, input: &str) -> Result<Option<PendingTurn>, DomainError> {
        if input.trim().is_empty() {
            debug!("Ignoring blank submission");
            return Ok(None);
        }

        if self.awaiting_response {
            warn!("Rejecting submission while a completion is in flight");
            return Err(DomainError::Busy);
        }

        self.append(Turn::user(input));
        self.awaiting_response = true;

        info!(
            "Submitting conversation of {} turns ({} chars) to {}",
            self.conversation.len(),
            self.conversation.content_chars(),
            self.client.model_name()
        );

        Ok(Some(PendingTurn {
            history: self.conversation.turns().to_vec(),
            api_key: self.api_key.current(),
        }))
    }

    /// Apply the outcome of the pending turn and return to Idle.
    ///
    /// Failures become assistant turns carrying the rendered error.
    pub fn resolve(&mut self, result: Result<String, DomainError>) {
        if !self.awaiting_response {
            warn!("Ignoring completion result with no pending turn");
            return;
        }
        self.awaiting_response = false;

        match result {
            Ok(text) => {
                info!("Received assistant reply ({} chars)", text.chars().count());
                self.append(Turn::assistant(text));
            }
            Err(e) => {
                warn!("Completion failed: {}", e);
                self.append(Turn::assistant(format!("Error: {}", e)));
            }
        }
    }

    fn append(&mut self, turn: Turn) {
        debug!(
            "Appending {} turn {} (created at {})",
            turn.role(),
            turn.id(),
            turn.created_at()
        );
        self.conversation.push(turn);
    }

    /// Submit `input`, wait for the completion, and apply it.
    ///
    /// Returns `Ok(false)` when the input was blank and nothing was sent.
    pub async fn submit(&mut self, input: &str) -> Result<bool, DomainError> {
        let Some(pending) = self.begin_turn(input)? else {
            return Ok(false);
        };
        let client = self.client();
        let result = pending.send(client.as_ref()).await;
        self.resolve(result);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{MockCompletionClient, MockReply};
    use crate::domain::Role;

    fn orchestrator_with(reply: MockReply) -> (TurnOrchestrator, Arc<MockCompletionClient>) {
        let client = Arc::new(MockCompletionClient::new(reply));
        let handle = ApiKeyHandle::new(ApiKey::new("sk-test").unwrap());
        (TurnOrchestrator::new(client.clone(), handle), client)
    }

    #[test]
    fn begin_turn_appends_user_turn_before_any_call() {
        let (mut orchestrator, client) = orchestrator_with(MockReply::Fixed("ok".into()));

        let pending = orchestrator.begin_turn("Hello").unwrap();

        assert!(pending.is_some());
        assert!(orchestrator.is_awaiting_response());
        assert_eq!(orchestrator.conversation().len(), 1);
        let turn = &orchestrator.conversation().turns()[0];
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "Hello");
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn user_content_is_kept_exactly() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Echo);

        orchestrator.begin_turn("  padded input\n").unwrap();

        assert_eq!(
            orchestrator.conversation().turns()[0].content(),
            "  padded input\n"
        );
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let (mut orchestrator, client) = orchestrator_with(MockReply::Echo);

        for input in ["", "   ", "\n\t "] {
            assert!(orchestrator.begin_turn(input).unwrap().is_none());
            assert!(!orchestrator.submit(input).await.unwrap());
        }

        assert!(orchestrator.conversation().is_empty());
        assert!(!orchestrator.is_awaiting_response());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn success_appends_single_assistant_turn() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Fixed("X".into()));

        assert!(orchestrator.submit("question").await.unwrap());

        let turns = orchestrator.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role(), Role::Assistant);
        assert_eq!(turns[1].content(), "X");
        assert!(!orchestrator.is_awaiting_response());
    }

    #[tokio::test]
    async fn failure_appends_error_as_assistant_turn() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Fail(503));

        orchestrator.submit("question").await.unwrap();

        let turns = orchestrator.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role(), Role::Assistant);
        assert_eq!(turns[1].content(), "Error: API error (status 503)");
        assert!(!orchestrator.is_awaiting_response());
    }

    #[tokio::test]
    async fn awaiting_flag_spans_exactly_the_pending_call() {
        let (mut orchestrator, client) = orchestrator_with(MockReply::Fixed("done".into()));
        assert!(!orchestrator.is_awaiting_response());

        let pending = orchestrator.begin_turn("hi").unwrap().unwrap();
        assert!(orchestrator.is_awaiting_response());

        let result = pending.send(client.as_ref()).await;
        assert!(orchestrator.is_awaiting_response());

        orchestrator.resolve(result);
        assert!(!orchestrator.is_awaiting_response());
    }

    #[test]
    fn second_submission_while_pending_is_rejected() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Echo);

        let _pending = orchestrator.begin_turn("first").unwrap().unwrap();
        let err = orchestrator.begin_turn("second").unwrap_err();

        assert!(err.is_busy());
        assert_eq!(orchestrator.conversation().len(), 1);
    }

    #[tokio::test]
    async fn full_history_is_sent_in_order() {
        let (mut orchestrator, client) = orchestrator_with(MockReply::Echo);

        orchestrator.submit("one").await.unwrap();
        orchestrator.submit("two").await.unwrap();
        let pending = orchestrator.begin_turn("three").unwrap().unwrap();

        let contents: Vec<&str> = pending.history().iter().map(|t| t.content()).collect();
        assert_eq!(contents, vec!["one", "one", "two", "two", "three"]);

        orchestrator.resolve(pending.send(client.as_ref()).await);
        let recorded = client.recorded_histories();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[2].len(), 5);
    }

    #[test]
    fn resolve_without_pending_turn_is_ignored() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Echo);

        orchestrator.resolve(Ok("stray".into()));

        assert!(orchestrator.conversation().is_empty());
    }

    #[test]
    fn pending_turn_uses_key_current_at_submission() {
        let (mut orchestrator, _) = orchestrator_with(MockReply::Echo);
        orchestrator
            .api_key()
            .replace(ApiKey::new("sk-rotated").unwrap());

        let pending = orchestrator.begin_turn("hi").unwrap().unwrap();

        assert_eq!(pending.api_key.expose(), "sk-rotated");
    }
}
