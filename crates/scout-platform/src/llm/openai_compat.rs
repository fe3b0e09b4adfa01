//! OpenAI-compatible LLM adapter.
//!
//! Works with OpenAI, DeepSeek, and any provider using the
//! OpenAI chat completions API format.
//! Uses an async `reqwest` client; streaming reads the SSE body chunk by chunk.
//! The client only bounds connection setup. Each request carries its own
//! deadline, and a streamed reply gets the longer stream deadline.

use std::pin::Pin;
use std::time::Duration;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use scout_core::ports::*;
use scout_types::{
    Result, ScoutError,
    config::LlmConfig,
    message::{Message, Role},
};
use super::sse::decode_stream;

/// Provider that speaks the OpenAI chat completions protocol.
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
    pub(crate) request_timeout: Duration,
    pub(crate) stream_timeout: Duration,
}

impl OpenAiCompatProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let request_timeout = Duration::from_secs(config.timeout_secs);
        let stream_timeout = Duration::from_secs(config.stream_timeout_secs).max(request_timeout);
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| ScoutError::Config(format!("http client: {e}")))?;
        let base_url = config.base_url().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ScoutError::Config(
                "custom provider requires llm.api_base".to_string(),
            ));
        }
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url,
            request_timeout,
            stream_timeout,
        })
    }

    /// Same endpoint and timeouts, different key. Used for validation.
    pub fn with_api_key(&self, api_key: &str) -> Self {
        Self {
            client: self.client.clone(),
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            request_timeout: self.request_timeout,
            stream_timeout: self.stream_timeout,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> ScoutError {
        transport_error(e, self.request_timeout)
    }
}

fn transport_error(e: reqwest::Error, deadline: Duration) -> ScoutError {
    if e.is_timeout() {
        ScoutError::Timeout(deadline.as_millis() as u64)
    } else {
        ScoutError::Network(e.to_string())
    }
}

pub fn build_request_body(req: &ChatRequest, stream: bool) -> Value {
    let messages: Vec<Value> = req.messages.iter().map(message_to_json).collect();

    let mut body = json!({
        "model": req.model,
        "messages": messages,
        "max_tokens": req.max_tokens,
        "temperature": req.temperature,
    });
    if stream {
        body["stream"] = json!(true);
    }
    body
}

#[async_trait(?Send)]
impl LlmPort for OpenAiCompatProvider {
    async fn chat_completion(&self, req: ChatRequest) -> Result<ChatResponse> {
        let body = build_request_body(&req, false);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ScoutError::Llm(format!("HTTP {}: {}", status, text)));
        }

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::Llm(e.to_string()))?;
        parse_api_response(data)
    }

    fn stream_chat(
        &self,
        req: ChatRequest,
    ) -> Pin<Box<dyn Stream<Item = LlmStreamEvent>>> {
        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .timeout(self.stream_timeout)
            .json(&build_request_body(&req, true));
        let deadline = self.stream_timeout;

        let events = async move {
            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    let message = transport_error(e, deadline).to_string();
                    return stream::once(async move { LlmStreamEvent::Error(message) })
                        .boxed_local();
                }
            };

            let status = response.status();
            if !status.is_success() {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                let message = format!("HTTP {}: {}", status, text);
                return stream::once(async move { LlmStreamEvent::Error(message) })
                    .boxed_local();
            }

            decode_stream(response.bytes_stream()).boxed_local()
        };

        Box::pin(stream::once(events).flatten())
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(ScoutError::Llm(format!("HTTP {}", response.status())));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ScoutError::Llm(e.to_string()))?;
        Ok(parse_model_list(&data))
    }
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
pub struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ─── Serialization helpers ───────────────────────────────────

fn message_to_json(msg: &Message) -> Value {
    json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    })
}

pub fn parse_api_response(data: ApiResponse) -> Result<ChatResponse> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ScoutError::Llm("No choices in response".to_string()))?;

    let role = match choice.message.role.as_str() {
        "system" => Role::System,
        "user" => Role::User,
        _ => Role::Assistant,
    };
    let message = Message {
        role,
        content: choice.message.content.unwrap_or_default(),
    };
    let usage = data.usage.map(|u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ChatResponse { message, usage })
}

pub fn parse_model_list(data: &Value) -> Vec<String> {
    data["data"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m["id"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
