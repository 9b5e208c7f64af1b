//! Blocking HTTP transport for OpenAI-compatible chat-completion endpoints.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::conversation::{ConversationMessage, Role};
use crate::errors::SelectorError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Failure modes of one request/response cycle.
///
/// Every transport fault is translated into one of these values; nothing
/// else escapes to the orchestrator, which recovers locally by yielding a
/// no-op step.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint unreachable, URL unusable, or the connect timeout fired.
    #[error("unable to reach LLM endpoint: {0}")]
    Connect(String),

    /// The endpoint answered with a non-200 status.
    #[error("LLM endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The 200 reply envelope could not be decoded.
    #[error("unable to decode LLM reply: {0}")]
    Decode(String),
}

/// Wire-schema variant spoken by the configured endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    OpenAi,
    Gemini,
}

impl Platform {
    /// Path appended to `host:port` to reach the completion endpoint.
    ///
    /// The Gemini path carries a `%GEMINI_API_KEY%` credential placeholder
    /// that is substituted from the environment at call time.
    pub fn completions_path(&self) -> &'static str {
        match self {
            Platform::OpenAi => "/v1/chat/completions",
            Platform::Gemini => {
                "/v1beta/models/gemini-2.0-flash:generateContent?key=%GEMINI_API_KEY%"
            }
        }
    }

    fn request_body(&self, conversation: &[ConversationMessage]) -> JsonValue {
        match self {
            Platform::OpenAi => json!({ "messages": conversation }),
            Platform::Gemini => {
                // Gemini has no system role on this surface; system turns
                // are folded into the user role.
                let contents: Vec<JsonValue> = conversation
                    .iter()
                    .map(|message| {
                        let role = match message.role {
                            Role::Assistant => "model",
                            Role::System | Role::User => "user",
                        };
                        json!({ "role": role, "parts": [{ "text": message.content }] })
                    })
                    .collect();
                json!({ "contents": contents })
            }
        }
    }
}

/// The model's reply text plus the usage token count reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelReply {
    pub content: String,
    pub total_tokens: u64,
}

/// Performs the blocking request/response cycle against the endpoint.
pub struct LlmTransport {
    client: Client,
    endpoint: String,
    platform: Platform,
}

impl LlmTransport {
    pub fn new(
        host: &str,
        port: u16,
        platform: Platform,
        connect_timeout: Duration,
    ) -> Result<Self, SelectorError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| SelectorError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            endpoint: format!("{host}:{port}{}", platform.completions_path()),
            platform,
        })
    }

    /// Send the conversation and return the normalized reply text.
    ///
    /// Reply text is stripped of embedded newlines and trailing whitespace
    /// before classification; raw model output routinely needs this
    /// cleanup.
    pub fn send(
        &self,
        conversation: &[ConversationMessage],
    ) -> Result<RawModelReply, TransportError> {
        let url = substitute_placeholders(&self.endpoint);
        debug!(target: "transport", endpoint = %url, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&self.platform.request_body(conversation))
            .send()
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            error!(
                target: "transport",
                status = status.as_u16(),
                body = %body,
                "LLM endpoint returned an error"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response
            .text()
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        let (content, total_tokens) = self.decode_reply(&raw)?;

        info!(target: "transport", total_tokens, "LLM usage");

        Ok(RawModelReply {
            content: normalize_reply_text(&content),
            total_tokens,
        })
    }

    fn decode_reply(&self, raw: &str) -> Result<(String, u64), TransportError> {
        match self.platform {
            Platform::OpenAi => {
                let reply: ChatCompletionResponse = serde_json::from_str(raw)
                    .map_err(|err| TransportError::Decode(err.to_string()))?;
                let content = reply
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| TransportError::Decode("reply contained no choices".into()))?;
                let tokens = reply.usage.map(|usage| usage.total_tokens).unwrap_or(0);
                Ok((content, tokens))
            }
            Platform::Gemini => {
                let reply: GenerateContentResponse = serde_json::from_str(raw)
                    .map_err(|err| TransportError::Decode(err.to_string()))?;
                let content = reply
                    .candidates
                    .into_iter()
                    .next()
                    .map(|candidate| {
                        candidate
                            .content
                            .parts
                            .into_iter()
                            .filter_map(|part| part.text)
                            .collect::<Vec<_>>()
                            .join("")
                    })
                    .filter(|text| !text.is_empty())
                    .ok_or_else(|| {
                        TransportError::Decode("reply contained no candidates".into())
                    })?;
                let tokens = reply
                    .usage_metadata
                    .map(|usage| usage.total_token_count)
                    .unwrap_or(0);
                Ok((content, tokens))
            }
        }
    }
}

/// Substitute `%NAME%` credential placeholders from the process environment.
///
/// A placeholder whose variable is absent is left literally in place: the
/// request then fails with an explicit, debuggable transport error instead
/// of silently targeting the wrong endpoint.
fn substitute_placeholders(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find('%') {
        let Some(offset) = rest[start + 1..].find('%') else {
            break;
        };
        let end = start + 1 + offset;
        let name = &rest[start + 1..end];
        out.push_str(&rest[..start]);
        match env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[start..=end]),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

fn normalize_reply_text(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim_end().to_string()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u64,
}
