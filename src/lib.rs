pub mod application;
pub mod connector;
pub mod domain;

pub use application::{
    CompletionClient, PendingTurn, SettingsStore, TurnOrchestrator, UpdateApiKeyUseCase,
};

pub use connector::{
    AppConfig, JsonSettingsStore, MockCompletionClient, MockReply, OpenAiCompletionClient,
};

pub use domain::{
    extract_code_spans, split_segments, ApiKey, ApiKeyHandle, CodeSpan, Conversation,
    DomainError, Role, Segment, Turn,
};
