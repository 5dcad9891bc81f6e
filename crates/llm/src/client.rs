//! LLM client abstraction and request/response types.
//!
//! This module defines the generation backend interface: an ordered list of
//! messages plus an optional set of tool descriptors goes in, one assistant
//! message comes out. When tools are supplied the reply may carry tool calls
//! instead of content.

use crate::message::Message;
use groundwork_core::AppResult;
use serde::{Deserialize, Serialize};

/// Descriptor of a tool the model may call.
///
/// The description is the only signal the model has for deciding whether
/// to call the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name as the model will reference it
    pub name: String,

    /// Natural-language description of when to use the tool
    pub description: String,

    /// JSON Schema for the tool's arguments
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Tool taking a single required free-text `query` argument.
    pub fn query_tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "llama3.2", "gpt-4o-mini")
    pub model: String,

    /// Conversation so far, in order
    pub messages: Vec<Message>,

    /// Tools bound to this call; `None` means the model cannot request any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with required fields.
    pub fn new(messages: Vec<Message>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Bind tools to this call.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated assistant message
    pub message: Message,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for LLM providers.
///
/// This trait abstracts the underlying chat-completion provider (Ollama,
/// OpenAI-compatible servers, test doubles) behind a single call.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Perform one chat completion.
    ///
    /// The returned message is always an assistant message.
    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_tool_schema() {
        let spec = ToolSpec::query_tool("retrieve_product_catalog", "Catalog lookups");
        assert_eq!(spec.parameters["required"][0], "query");
        assert_eq!(spec.parameters["properties"]["query"]["type"], "string");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![Message::user("hi")], "llama3.2")
            .with_temperature(Some(0.2))
            .with_max_tokens(256);
        assert!(!request.has_tools());
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(256));

        let with_tools = request.with_tools(vec![ToolSpec::query_tool("a", "b")]);
        assert!(with_tools.has_tools());
    }

    #[test]
    fn test_usage_total() {
        let usage = LlmUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
    }
}
