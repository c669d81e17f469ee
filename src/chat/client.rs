use std::env;
use std::error::Error;
use std::fmt;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::message::{Message, ToolCallRequest};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// What a completion request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Final assistant text.
    Final(String),
    /// The model asked for a local function to run.
    ToolCall(ToolCallRequest),
}

/// Completion request failure.
#[derive(Debug)]
pub enum ClientError {
    MissingApiKey { key_env: &'static str },
    Request(reqwest::Error),
    Api { status: StatusCode, body: String },
    EmptyResponse,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey { key_env } => {
                write!(f, "{key_env} is not set in the environment")
            }
            Self::Request(source) => write!(f, "completion request failed: {source}"),
            Self::Api { status, body } => write!(f, "completion API error {status}: {body}"),
            Self::EmptyResponse => write!(f, "completion response did not contain a message"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Request(source) => Some(source),
            _ => None,
        }
    }
}

/// Seam between the conversation engine and the completion service.
pub trait Completion {
    /// Sends the transcript and returns one structured outcome.
    fn complete(
        &self,
        messages: &[Message],
        model: &str,
        tools: Option<&[Value]>,
    ) -> Result<CompletionOutcome, ClientError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

#[derive(Debug, Deserialize)]
struct AssistantReply {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallRequest>,
}

impl AssistantReply {
    /// Only the first requested call is honored; the single-call
    /// restriction is a hard contract of this client.
    fn into_outcome(self) -> Result<CompletionOutcome, ClientError> {
        if let Some(call) = self.tool_calls.into_iter().next() {
            return Ok(CompletionOutcome::ToolCall(call));
        }
        self.content
            .filter(|content| !content.is_empty())
            .map(CompletionOutcome::Final)
            .ok_or(ClientError::EmptyResponse)
    }
}

/// Blocking chat-completions client.
///
/// One POST per call; no retries, no streaming. The credential is read
/// from the environment at request time so the REPL can start without
/// one.
#[derive(Debug, Clone)]
pub struct HttpCompletions {
    client: Client,
    base_url: String,
}

impl Default for HttpCompletions {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCompletions {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: CHAT_COMPLETIONS_URL.to_string(),
        }
    }
}

impl Completion for HttpCompletions {
    fn complete(
        &self,
        messages: &[Message],
        model: &str,
        tools: Option<&[Value]>,
    ) -> Result<CompletionOutcome, ClientError> {
        let api_key = env::var(API_KEY_ENV).map_err(|_| ClientError::MissingApiKey {
            key_env: API_KEY_ENV,
        })?;

        let payload = ChatCompletionRequest {
            model,
            messages,
            tools,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&api_key)
            .json(&payload)
            .send()
            .map_err(ClientError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }

        let body: ChatCompletionResponse = response.json().map_err(ClientError::Request)?;
        body.choices
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyResponse)?
            .message
            .into_outcome()
    }
}
