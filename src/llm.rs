use crate::config::Config;
use crate::error::ReplyUnavailable;
use crate::message::Message;
use crate::prompts::SYSTEM_PROMPT;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{debug, warn};

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Message in conversation, as sent on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

impl From<&Message> for LlmMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.origin().role(), message.content())
    }
}

/// Request to send to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
}

impl LlmRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self { messages }
    }
}

/// Build the ordered turn list for a completion request.
///
/// The system preamble comes first, then every prior transcript entry in
/// insertion order, then the new user turn. Nothing is dropped or reordered.
pub fn build_request_payload(history: &[Message], new_user_text: &str) -> Vec<LlmMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(LlmMessage::system(SYSTEM_PROMPT));
    messages.extend(history.iter().map(LlmMessage::from));
    messages.push(LlmMessage::user(new_user_text));
    messages
}

/// Anything that can turn a list of turns into an assistant reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String, ReplyUnavailable>;
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
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

/// Extract the first choice's message content from a response body.
pub fn parse_completion(body: &str) -> Result<String, ReplyUnavailable> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ReplyUnavailable::Malformed(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReplyUnavailable::Malformed("response has no choices".to_string()))?;

    choice
        .message
        .content
        .ok_or_else(|| ReplyUnavailable::Malformed("choice has no message content".to_string()))
}

/// HTTP client for OpenRouter's OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    referer: String,
    app_title: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenRouterClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            COMPLETIONS_PATH
        );

        Ok(Self {
            client,
            api_key: config.get_api_key(),
            endpoint,
            model: config.model.clone(),
            referer: config.referer.clone(),
            app_title: config.app_title.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenRouterClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, ReplyUnavailable> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ReplyUnavailable::MissingCredential)?;

        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            turns = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "completion service returned an error status");
            return Err(ReplyUnavailable::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_starts_with_system_and_ends_with_new_turn() {
        let history = vec![
            Message::user("What is a stack?"),
            Message::assistant("A LIFO structure."),
        ];

        let payload = build_request_payload(&history, "And a queue?");

        assert_eq!(payload.len(), 2 + history.len());
        assert_eq!(payload[0], LlmMessage::system(SYSTEM_PROMPT));
        assert_eq!(payload[1], LlmMessage::new("user", "What is a stack?"));
        assert_eq!(payload[2], LlmMessage::new("assistant", "A LIFO structure."));
        assert_eq!(payload[3], LlmMessage::user("And a queue?"));
    }

    #[test]
    fn test_payload_for_empty_history() {
        let payload = build_request_payload(&[], "hello");
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].role, "system");
        assert_eq!(payload[1], LlmMessage::user("hello"));
    }

    #[test]
    fn test_payload_keeps_duplicate_turns() {
        let history = vec![
            Message::user("again"),
            Message::assistant("sure"),
            Message::user("again"),
            Message::assistant("sure"),
        ];

        let payload = build_request_payload(&history, "again");
        let contents: Vec<&str> = payload[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["again", "sure", "again", "sure", "again"]);
    }

    #[test]
    fn test_parse_completion_returns_content_verbatim() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Binary search halves the range each step.\n"}}]}"#;
        assert_eq!(
            parse_completion(body).unwrap(),
            "  Binary search halves the range each step.\n"
        );
    }

    #[test]
    fn test_parse_completion_rejects_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":42}}]}"#,
            "not json",
        ] {
            let err = parse_completion(body).unwrap_err();
            assert_eq!(err.kind(), "malformed", "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_network() {
        let config = Config {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let mut client = OpenRouterClient::new(&config).unwrap();
        client.api_key = None;

        let err = client
            .complete(LlmRequest::new(vec![LlmMessage::user("hi")]))
            .await
            .unwrap_err();
        assert_eq!(err, ReplyUnavailable::MissingCredential);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = Config {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            ..Config::default()
        };
        let client = OpenRouterClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(client.model(), "openai/gpt-4o-mini");
    }
}
