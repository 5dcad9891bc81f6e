//! LLM integration crate for Groundwork.
//!
//! This crate provides a provider-agnostic chat-completion abstraction with
//! function-tool support. Conversations are sequences of [`Message`]s; a call
//! may bind [`ToolSpec`]s, in which case the reply can carry tool calls.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: api.openai.com or any compatible server
//!
//! # Example
//! ```no_run
//! use groundwork_llm::{ChatRequest, LlmClient, Message, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new(vec![Message::user("Hello, world!")], "llama3.2");
//! let response = client.chat(&request).await?;
//! println!("{}", response.message.content());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod message;
pub mod providers;

// Re-export main types
pub use client::{ChatRequest, ChatResponse, LlmClient, LlmUsage, ToolSpec};
pub use factory::create_client;
pub use message::{Message, Role, ToolCall};
pub use providers::{OllamaClient, OpenAiClient};
