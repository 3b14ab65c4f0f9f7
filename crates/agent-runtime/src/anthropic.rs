//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` for the Anthropic Messages API with
//! `stream: true`. Server-sent events are decoded into `StreamFragment`s.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{ContentBlock, Message, MessageContent},
    provider::{ChatRequest, CompletionStream, FinishReason, LlmProvider, StreamFragment},
};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};

use crate::sse::SseDecoder;

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".into(),
            timeout_secs: 300,
        }
    }
}

impl AnthropicConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".into());
        let timeout_secs = parse_timeout(std::env::var("ANTHROPIC_TIMEOUT_SECS").ok(), 300)?;

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
        })
    }
}

fn parse_timeout(raw: Option<String>, default: u64) -> Result<u64> {
    raw.map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|_| {
            AgentError::Config(format!("ANTHROPIC_TIMEOUT_SECS is not a number: {raw}"))
        })
    })
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the Messages API request body
    fn build_body(request: &ChatRequest<'_>) -> Value {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema(),
                })
            })
            .collect();

        let mut body = json!({
            "model": request.options.model,
            "max_tokens": request.options.max_tokens,
            "temperature": request.options.temperature,
            "system": request.system,
            "messages": Self::convert_messages(request.messages),
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools);
        }
        body
    }

    /// Convert agent messages to Anthropic format
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                let content = match &m.content {
                    MessageContent::Text(text) => Value::String(text.clone()),
                    MessageContent::Blocks(blocks) => {
                        Value::Array(blocks.iter().map(convert_block).collect())
                    }
                };
                json!({ "role": m.role.to_string(), "content": content })
            })
            .collect()
    }
}

fn convert_block(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::ToolUse { id, name, input } => {
            json!({ "type": "tool_use", "id": id, "name": name, "input": input })
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => json!({
            "type": "tool_result",
            "tool_use_id": tool_use_id,
            "content": content,
            "is_error": is_error,
        }),
    }
}

/// Map a non-success HTTP status to an agent error
fn status_to_error(status: u16, body: &str) -> AgentError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status {
        429 | 529 => AgentError::RateLimited(message),
        401 | 403 => AgentError::Auth(message),
        502..=504 => AgentError::ProviderUnavailable(message),
        _ => AgentError::Provider(format!("HTTP {status}: {message}")),
    }
}

/// Translates Messages API stream events into fragments.
#[derive(Debug, Default)]
struct EventDecoder {
    in_tool_block: bool,
}

impl EventDecoder {
    fn decode(&mut self, event: &Value) -> Result<Option<StreamFragment>> {
        let fragment = match event["type"].as_str().unwrap_or_default() {
            "content_block_start" => {
                let block = &event["content_block"];
                match block["type"].as_str() {
                    Some("tool_use") => {
                        self.in_tool_block = true;
                        Some(StreamFragment::ToolCallStart {
                            id: block["id"].as_str().unwrap_or_default().to_string(),
                            name: block["name"].as_str().unwrap_or_default().to_string(),
                        })
                    }
                    Some("text") => block["text"]
                        .as_str()
                        .filter(|t| !t.is_empty())
                        .map(|t| StreamFragment::TextDelta(t.to_string())),
                    _ => None,
                }
            }
            "content_block_delta" => {
                let delta = &event["delta"];
                match delta["type"].as_str() {
                    Some("text_delta") => delta["text"]
                        .as_str()
                        .map(|t| StreamFragment::TextDelta(t.to_string())),
                    Some("input_json_delta") => delta["partial_json"]
                        .as_str()
                        .map(|j| StreamFragment::ToolCallDelta(j.to_string())),
                    _ => None,
                }
            }
            "content_block_stop" => {
                if self.in_tool_block {
                    self.in_tool_block = false;
                    Some(StreamFragment::ToolCallEnd)
                } else {
                    None
                }
            }
            "message_delta" => event["delta"]["stop_reason"].as_str().map(|reason| {
                StreamFragment::TurnEnd {
                    stop_reason: finish_reason(reason),
                }
            }),
            "error" => {
                let error = &event["error"];
                let message = error["message"].as_str().unwrap_or("stream error").to_string();
                return Err(match error["type"].as_str() {
                    Some("rate_limit_error" | "overloaded_error") => AgentError::RateLimited(message),
                    _ => AgentError::Provider(message),
                });
            }
            _ => None,
        };
        Ok(fragment)
    }
}

fn finish_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolUse,
        "refusal" => FinishReason::ContentFilter,
        _ => FinishReason::Other,
    }
}

/// Decode one SSE payload, skipping ones that are not JSON.
fn decode_payload(decoder: &mut EventDecoder, payload: &str) -> Result<Option<StreamFragment>> {
    match serde_json::from_str::<Value>(payload) {
        Ok(event) => decoder.decode(&event),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping non-JSON stream payload");
            Ok(None)
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("models"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn stream(&self, request: &ChatRequest<'_>) -> Result<CompletionStream> {
        let body = Self::build_body(request);

        tracing::debug!(
            model = %request.options.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Anthropic stream request"
        );

        let response = self
            .client
            .post(self.url("messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &text));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut sse = SseDecoder::new();
            let mut decoder = EventDecoder::default();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AgentError::ProviderUnavailable(e.to_string()));
                        return;
                    }
                };

                for payload in sse.push(&chunk) {
                    match decode_payload(&mut decoder, &payload) {
                        Ok(Some(fragment)) => yield Ok(fragment),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(payload) = sse.finish() {
                match decode_payload(&mut decoder, &payload) {
                    Ok(Some(fragment)) => yield Ok(fragment),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use agent_core::provider::GenerationOptions;
    use agent_core::tool::{ParameterSchema, ToolSchema};
    use agent_core::Role;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_timeout_setting() {
        assert_eq!(parse_timeout(None, 300).unwrap(), 300);
        assert_eq!(parse_timeout(Some("120".into()), 300).unwrap(), 120);
        assert!(matches!(
            parse_timeout(Some("five minutes".into()), 300),
            Err(AgentError::Config(_))
        ));
    }

    const TOOL_STREAM: &str = concat!(
        "event: message_start\n",
        "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Let me check.\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_user_info\",\"input\":{}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"handles\\\":\"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"[\\\"tourist\\\"]}\"}}\n\n",
        "event: content_block_stop\n",
        "data: {\"type\":\"content_block_stop\",\"index\":1}\n\n",
        "event: message_delta\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"tool_use\"},\"usage\":{\"output_tokens\":42}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );

    fn decode_all(body: &str) -> Result<Vec<StreamFragment>> {
        let mut sse = SseDecoder::new();
        let mut decoder = EventDecoder::default();
        let mut fragments = Vec::new();
        for payload in sse.push(body.as_bytes()) {
            if let Some(fragment) = decode_payload(&mut decoder, &payload)? {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            model: "test-model".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decodes_tool_use_stream() {
        let fragments = decode_all(TOOL_STREAM).unwrap();
        assert_eq!(
            fragments,
            vec![
                StreamFragment::TextDelta("Let me check.".into()),
                StreamFragment::ToolCallStart {
                    id: "toolu_1".into(),
                    name: "get_user_info".into()
                },
                StreamFragment::ToolCallDelta(r#"{"handles":"#.into()),
                StreamFragment::ToolCallDelta(r#"["tourist"]}"#.into()),
                StreamFragment::ToolCallEnd,
                StreamFragment::TurnEnd {
                    stop_reason: FinishReason::ToolUse
                },
            ]
        );
    }

    #[test]
    fn test_overloaded_event_is_rate_limit() {
        let body = "event: error\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n";
        assert!(matches!(decode_all(body), Err(AgentError::RateLimited(_))));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert!(matches!(status_to_error(429, body), AgentError::RateLimited(ref m) if m == "slow down"));
        assert!(matches!(status_to_error(529, ""), AgentError::RateLimited(_)));
        assert!(matches!(status_to_error(401, ""), AgentError::Auth(_)));
        assert!(matches!(status_to_error(400, "bad"), AgentError::Provider(_)));
    }

    #[test]
    fn test_request_body_carries_tools_and_blocks() {
        let tools = vec![ToolSchema {
            name: "get_user_info".into(),
            description: "User profiles".into(),
            parameters: vec![ParameterSchema::required("handles", "array", "Handles").with_items("string")],
            category: None,
        }];
        let messages = vec![
            Message::user("who is tourist?"),
            Message::blocks(
                Role::Assistant,
                vec![ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "get_user_info".into(),
                    input: json!({"handles": ["tourist"]}),
                }],
            ),
        ];
        let options = options();
        let request = ChatRequest {
            system: "be brief",
            messages: &messages,
            tools: &tools,
            options: &options,
        };

        let body = AnthropicProvider::build_body(&request);
        assert_eq!(body["stream"], true);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"][0]["content"], "who is tourist?");
        assert_eq!(body["messages"][1]["content"][0]["type"], "tool_use");
        assert_eq!(body["tools"][0]["input_schema"]["required"], json!(["handles"]));
    }

    fn provider(server: &MockServer) -> AnthropicProvider {
        AnthropicProvider::from_config(AnthropicConfig {
            api_key: "test-key".into(),
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_stream_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(TOOL_STREAM, "text/event-stream"))
            .mount(&server)
            .await;

        let messages = vec![Message::user("hi")];
        let options = options();
        let request = ChatRequest {
            system: "",
            messages: &messages,
            tools: &[],
            options: &options,
        };

        let stream = provider(&server).stream(&request).await.unwrap();
        let fragments: Vec<_> = stream.collect().await;
        assert_eq!(fragments.len(), 6);
        assert!(fragments.iter().all(std::result::Result::is_ok));
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_string(
                r#"{"type":"error","error":{"type":"rate_limit_error","message":"Too many requests"}}"#,
            ))
            .mount(&server)
            .await;

        let messages = vec![Message::user("hi")];
        let options = options();
        let request = ChatRequest {
            system: "",
            messages: &messages,
            tools: &[],
            options: &options,
        };

        let err = provider(&server).stream(&request).await.err().unwrap();
        assert!(err.is_rate_limited());
    }
}
