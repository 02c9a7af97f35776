use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::{ensure_history, CompletionClient};
use crate::domain::{ApiKey, DomainError, Role, Turn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 60;
/// Status reported when a 2xx body has no usable `choices[0].message.content`.
pub const MALFORMED_RESPONSE_STATUS: u16 = 500;

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for the OpenAI Chat Completions API (and compatible servers).
///
/// One `POST` per call with the whole history as `messages`. No retries and no
/// timeout beyond the `reqwest` default.
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    model: String,
    max_tokens: u32,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiCompletionClient {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH);
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            url,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request<'a>(&'a self, history: &'a [Turn]) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|turn| ApiMessage {
                    role: turn.role(),
                    content: turn.content(),
                })
                .collect(),
            max_tokens: self.max_tokens,
        }
    }

    /// Pull `choices[0].message.content` out of a 2xx body.
    fn parse_reply(body: &str) -> Result<String, DomainError> {
        let api_response: ApiResponse = serde_json::from_str(body).map_err(|e| {
            warn!("OpenAiCompletionClient: failed to parse response: {e}");
            DomainError::api(MALFORMED_RESPONSE_STATUS)
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                warn!("OpenAiCompletionClient: response has no choices[0].message.content");
                DomainError::api(MALFORMED_RESPONSE_STATUS)
            })
    }
}

/// Transport failure with its whole cause chain; reqwest's own message only
/// names the URL.
fn transport_error(err: reqwest::Error) -> DomainError {
    DomainError::transport(format!("{:#}", anyhow::Error::new(err)))
}

impl Default for OpenAiCompletionClient {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, history: &[Turn], api_key: &ApiKey) -> Result<String, DomainError> {
        ensure_history(history)?;

        let request = self.build_request(history);
        debug!(
            "OpenAiCompletionClient: sending {} messages to {} (model {})",
            request.messages.len(),
            self.url,
            self.model
        );

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAiCompletionClient: API returned {status}: {body}");
            return Err(DomainError::api(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(transport_error)?;

        Self::parse_reply(&body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
