//! OpenAI-compatible chat completions provider.
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` surface. Tool-call arguments travel as JSON-encoded
//! strings on the wire and are decoded into objects here.

use crate::client::{ChatRequest, ChatResponse, LlmClient, LlmUsage, ToolSpec};
use crate::message::{Message, ToolCall};
use groundwork_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI chat completions client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client for the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_OPENAI_URL, api_key, timeout)
    }

    /// Create a client for an OpenAI-compatible server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn to_openai_request(&self, request: &ChatRequest) -> OpenAiChatRequest {
        OpenAiChatRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(to_openai_message).collect(),
            tools: request
                .tools
                .as_ref()
                .filter(|tools| !tools.is_empty())
                .map(|tools| tools.iter().map(to_openai_tool).collect()),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn convert_response(&self, response: OpenAiChatResponse) -> AppResult<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("OpenAI response contained no choices".to_string()))?;

        let mut tool_calls = Vec::with_capacity(choice.message.tool_calls.len());
        for call in choice.message.tool_calls {
            tool_calls.push(ToolCall::new(
                call.id,
                call.function.name,
                parse_arguments(&call.function.arguments)?,
            ));
        }

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ChatResponse {
            message: Message::assistant_with_tools(
                choice.message.content.unwrap_or_default(),
                tool_calls,
            ),
            model: response.model,
            usage,
        })
    }
}

fn parse_arguments(raw: &str) -> AppResult<serde_json::Map<String, serde_json::Value>> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::Llm(format!(
            "Tool call arguments are not an object: {}",
            other
        ))),
        Err(e) => Err(AppError::Llm(format!(
            "Malformed tool call arguments: {}",
            e
        ))),
    }
}

fn to_openai_message(message: &Message) -> OpenAiMessage {
    let tool_calls = message
        .tool_calls()
        .iter()
        .map(|call| OpenAiToolCall {
            id: call.id.clone(),
            kind: function_kind(),
            function: OpenAiFunctionCall {
                name: call.name.clone(),
                arguments: serde_json::Value::Object(call.arguments.clone()).to_string(),
            },
        })
        .collect();

    let tool_call_id = match message {
        Message::Tool { tool_call_id, .. } => Some(tool_call_id.clone()),
        _ => None,
    };

    OpenAiMessage {
        role: message.role().as_str().to_string(),
        content: Some(message.content().to_string()),
        tool_calls,
        tool_call_id,
    }
}

fn to_openai_tool(spec: &ToolSpec) -> OpenAiTool {
    OpenAiTool {
        kind: "function",
        function: OpenAiFunction {
            name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
        },
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.has_tools(),
            "Sending chat request to OpenAI"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.to_openai_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("OpenAI request timed out: {}", e))
                } else {
                    AppError::Llm(format!("Failed to send request to OpenAI: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))?;

        self.convert_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_encodes_tool_arguments_as_string() {
        let mut args = serde_json::Map::new();
        args.insert("query".to_string(), serde_json::json!("embroidery"));
        let request = ChatRequest::new(
            vec![
                Message::user("patches?"),
                Message::assistant_with_tools(
                    "",
                    vec![ToolCall::new("call_a", "retrieve_website_data", args)],
                ),
                Message::tool("call_a", "retrieve_website_data", "Content: ...", vec![]),
            ],
            "gpt-4o-mini",
        )
        .with_tools(vec![ToolSpec::query_tool("retrieve_website_data", "site")]);

        let body = serde_json::to_value(client().to_openai_request(&request)).unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(
            body["messages"][1]["tool_calls"][0]["function"]["arguments"],
            "{\"query\":\"embroidery\"}"
        );
        assert_eq!(body["messages"][2]["tool_call_id"], "call_a");
    }

    #[test]
    fn test_response_decodes_tool_calls() {
        let raw = serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_xyz",
                        "type": "function",
                        "function": {"name": "retrieve_product_catalog", "arguments": "{\"query\":\"navy trucker\"}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let parsed: OpenAiChatResponse = serde_json::from_value(raw).unwrap();
        let response = client().convert_response(parsed).unwrap();

        assert_eq!(response.message.content(), "");
        let calls = response.message.tool_calls();
        assert_eq!(calls[0].id, "call_xyz");
        assert_eq!(calls[0].argument_str("query"), Some("navy trucker"));
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_malformed_arguments_rejected() {
        assert!(matches!(parse_arguments("{not json"), Err(AppError::Llm(_))));
        assert!(matches!(parse_arguments("[1,2]"), Err(AppError::Llm(_))));
        assert!(parse_arguments("").unwrap().is_empty());
    }

    #[test]
    fn test_empty_choices_is_error() {
        let parsed: OpenAiChatResponse =
            serde_json::from_value(serde_json::json!({"model": "m", "choices": []})).unwrap();
        assert!(client().convert_response(parsed).is_err());
    }
}
