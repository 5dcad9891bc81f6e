//! Command handlers for the Groundwork CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod demo;
pub mod knowledge;
pub mod prompts;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use demo::DemoCommand;
pub use knowledge::KnowledgeCommand;
pub use prompts::PromptsCommand;

use groundwork_core::{config::AppConfig, AppError, AppResult};
use groundwork_knowledge::{build_tool_set, Assistant, RagContext, TurnResult};
use groundwork_llm::create_client;
use groundwork_prompt::load_or_builtin;

/// Wire the generation client, retrieval tools and prompt into an assistant.
pub async fn build_assistant(config: &AppConfig) -> AppResult<Assistant> {
    config.validate()?;

    let api_key = config.resolve_api_key(&config.provider);
    let endpoint = config.resolve_endpoint(&config.provider);

    let client = create_client(
        &config.provider,
        endpoint.as_deref(),
        api_key.as_deref(),
        config.resolve_timeout(&config.provider),
    )
    .map_err(AppError::Config)?;

    let prompt = load_or_builtin(&config.workspace, &config.rag.prompt_id)?;
    let tools = build_tool_set(&config.workspace, &config.rag, api_key.as_deref()).await?;

    for tool in tools.iter() {
        tracing::debug!(
            tool = tool.name(),
            available = tool.is_available(),
            "Retrieval tool ready"
        );
    }

    Ok(Assistant::new(RagContext::new(
        client,
        config.model.clone(),
        tools,
        prompt,
        config.rag.clone(),
    )))
}

/// Print a turn result as pretty JSON on stdout.
pub fn print_json(result: &TurnResult) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
