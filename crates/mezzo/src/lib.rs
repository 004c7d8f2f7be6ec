//! Terminal chat tester for a persona-driven assistant.
//!
//! `mezzo` loads a persona document and a knowledge base from disk, composes
//! them into one system message, and runs an interactive chat loop against an
//! OpenAI-compatible chat completions endpoint. Every turn resends the whole
//! transcript; nothing is persisted between runs.
//!
//! # Getting started
//!
//! ```ignore
//! use mezzo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ChatError> {
//!     let config = ChatConfig::from_env()?;
//!     let context = load_session_context(&ContextPaths::under(&config.root))?;
//!     let system = compose_system_message(&context.persona, &context.knowledge_base);
//!
//!     let client = OpenAiClient::new(&config)?;
//!     let mut session = ChatSession::new(&client, StdinInput::new(), std::io::stdout(), &config, system);
//!     let outcome = session.run().await;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Read the persona and knowledge base:** [`context`] ([`load_context`](context::load_context),
//!   [`load_session_context`](context::load_session_context)).
//! - **Compose the system message:** [`prompt`] ([`compose_system_message`](prompt::compose_system_message),
//!   built on [`SystemPromptBuilder`](prompt::SystemPromptBuilder)).
//! - **Drive the chat:** [`session::ChatSession`] and its explicit
//!   [`ChatState`](session::ChatState) transitions.
//! - **Swap the remote service:** implement [`CompletionEndpoint`](endpoint::CompletionEndpoint).
//!   [`OpenAiClient`] is the HTTP implementation.
//! - **Retry transient failures:** [`api::retry`] (off by default).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`ChatConfig`](config::ChatConfig) from environment + overrides |
//! | [`context`] | Context file loading |
//! | [`prompt`] | System message composition |
//! | [`transcript`] | Ordered, role-checked conversation turns |
//! | [`endpoint`] | Completion endpoint trait |
//! | [`input`] | Console input sources with interrupt handling |
//! | [`session`] | Chat loop state machine |
//! | [`api`] | Retry with backoff |
//! | [`logging`] | `tracing` subscriber setup |

pub mod api;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod input;
pub mod logging;
pub mod prelude;
pub mod prompt;
pub mod session;
pub mod transcript;

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, trace};

pub use error::ChatError;

use crate::config::ChatConfig;

// ── Constants ──────────────────────────────────────────────────────

/// Default API base URL. Requests go to `{base}/chat/completions`.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the model identifier.
pub const MODEL_ENV: &str = "CHAT_MODEL";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Default model for chat turns.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Low temperature keeps the persona's answers consistent.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body.
#[derive(Serialize, Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Build a request for the given transcript with the configured model
    /// and temperature.
    pub fn new(model: impl Into<String>, messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature,
        }
    }
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One role-tagged turn of the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`OpenAiClient::chat()`].
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// A completion carrying only reply text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: None,
            finish_reason: Some("stop".into()),
        }
    }

    /// The reply text, or [`ChatError::EmptyCompletion`] when the model
    /// returned nothing usable.
    pub fn into_reply(self) -> Result<String, ChatError> {
        self.content.ok_or(ChatError::EmptyCompletion)
    }
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) url: String,
}

impl OpenAiClient {
    /// Create a client from the session configuration.
    ///
    /// No request timeout is set unless `config.timeout` is `Some`.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            url: completions_url(&config.base_url),
        })
    }

    /// The full URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        debug!(
            "LLM request: model={}, messages={}, temp={}",
            body.model,
            body.messages.len(),
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ChatError::Request(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(ChatError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_chat_response(&text)
    }
}

/// Join a base URL and the completions path without doubling slashes.
pub fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Decode a successful response body into a [`ChatCompletion`].
fn parse_chat_response(text: &str) -> Result<ChatCompletion, ChatError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| ChatError::Decode(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(ChatError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    match parsed.choices.and_then(|c| c.into_iter().next()) {
        Some(c) => {
            debug!(
                "LLM output: {} chars",
                c.message.content.as_ref().map_or(0, |s| s.len())
            );
            Ok(ChatCompletion {
                content: c.message.content,
                usage: parsed.usage,
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                content: None,
                usage: parsed.usage,
                finish_reason: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant("reply");
        assert_eq!(assist.role, MessageRole::Assistant);
        assert_eq!(assist.content, "reply");
    }

    #[test]
    fn request_serializes_roles_lowercase() {
        let req = ChatRequest::new(
            "gpt-4o",
            vec![Message::system("sys"), Message::user("hi")],
            0.3,
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn zero_temperature_still_sent() {
        let req = ChatRequest::new("m", vec![], 0.0);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        assert_eq!(
            completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://127.0.0.1:9000/v1"),
            "http://127.0.0.1:9000/v1/chat/completions"
        );
    }

    #[test]
    fn parse_takes_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Hi there"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let completion = parse_chat_response(body).unwrap();
        assert_eq!(completion.content.as_deref(), Some("Hi there"));
        assert_eq!(completion.usage.unwrap().total_tokens, Some(12));
    }

    #[test]
    fn parse_surfaces_api_error() {
        let body = r#"{"error": {"message": "model overloaded", "type": "server_error"}}"#;
        let err = parse_chat_response(body).unwrap_err();
        assert!(matches!(err, ChatError::Api(ref m) if m == "model overloaded"));
    }

    #[test]
    fn parse_rejects_malformed_body() {
        let err = parse_chat_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ChatError::Decode(_)));
    }

    #[test]
    fn no_choices_is_empty_completion() {
        let completion = parse_chat_response(r#"{"choices": []}"#).unwrap();
        assert!(completion.content.is_none());
        assert!(matches!(
            completion.into_reply(),
            Err(ChatError::EmptyCompletion)
        ));
    }
}
