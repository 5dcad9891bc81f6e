//! Shared pipeline context.
//!
//! Everything a turn needs (generation client, tool set, prompt definition,
//! tunables) is carried by an explicit [`RagContext`] built once at startup
//! and handed to the orchestrators, so several independently configured
//! assistants can live in one process.

use crate::tools::ToolSet;
use groundwork_core::{AppError, AppResult, RagConfig};
use groundwork_llm::{ChatRequest, LlmClient, Message, ToolCall};
use groundwork_prompt::{build_grounded_prompt, PromptDefinition};
use std::sync::Arc;

/// Separator between tool results folded into one context block.
const CONTEXT_SEPARATOR: &str = "\n\n";

pub struct RagContext {
    pub llm: Arc<dyn LlmClient>,
    pub model: String,
    pub tools: ToolSet,
    pub prompt: PromptDefinition,
    pub config: RagConfig,
}

impl RagContext {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tools: ToolSet,
        prompt: PromptDefinition,
        config: RagConfig,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            tools,
            prompt,
            config,
        }
    }

    /// One generation call, bounded by the backend timeout.
    ///
    /// With `with_tools`, every retrieval tool is bound to the request.
    pub(crate) async fn generate(
        &self,
        messages: Vec<Message>,
        with_tools: bool,
        step: &str,
    ) -> AppResult<Message> {
        let mut request = ChatRequest::new(messages, &self.model)
            .with_temperature(self.config.temperature);
        if with_tools && !self.tools.is_empty() {
            request = request.with_tools(self.tools.specs());
        }

        tracing::debug!(
            step,
            provider = self.llm.provider_name(),
            messages = request.messages.len(),
            tools = request.has_tools(),
            "Calling generation backend"
        );

        let timeout = self.config.backend_timeout();
        let response = tokio::time::timeout(timeout, self.llm.chat(&request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "{} call exceeded {}s",
                    step,
                    timeout.as_secs_f32()
                ))
            })??;

        Ok(response.message)
    }

    /// Execute tool calls one after another, appending one tool message per
    /// call in request order.
    pub(crate) async fn run_tools(&self, calls: &[ToolCall], working: &mut Vec<Message>) {
        for call in calls {
            let message = self.tools.execute(call).await;
            working.push(message);
        }
    }

    /// Final tool-free generation grounded on the trailing tool run.
    pub(crate) async fn grounded_answer(&self, working: &[Message]) -> AppResult<String> {
        self.grounded_answer_over(working, trailing_tool_run(working))
            .await
    }

    /// Final tool-free generation grounded on the given tool results.
    pub(crate) async fn grounded_answer_over(
        &self,
        working: &[Message],
        results: &[Message],
    ) -> AppResult<String> {
        let messages = compose_grounded_messages_over(&self.prompt, working, results)?;
        let reply = self.generate(messages, false, "generate").await?;
        Ok(reply.content().to_string())
    }
}

/// The contiguous run of tool messages at the end of `messages`.
pub fn trailing_tool_run(messages: &[Message]) -> &[Message] {
    let start = messages
        .iter()
        .rposition(|m| !m.is_tool())
        .map_or(0, |i| i + 1);
    &messages[start..]
}

/// Transcript shown to the final generation step.
///
/// System and user messages are kept, assistant messages only when they
/// requested no tools, and tool messages are dropped.
pub fn filtered_transcript(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| match m {
            Message::System { .. } | Message::User { .. } => true,
            Message::Assistant { tool_calls, .. } => tool_calls.is_empty(),
            Message::Tool { .. } => false,
        })
        .cloned()
        .collect()
}

/// Build the request messages for grounded generation: the rendered system
/// instruction followed by the filtered transcript.
pub fn compose_grounded_messages(
    prompt: &PromptDefinition,
    working: &[Message],
) -> AppResult<Vec<Message>> {
    compose_grounded_messages_over(prompt, working, trailing_tool_run(working))
}

/// Like [`compose_grounded_messages`], with the context taken from `results`
/// instead of the trailing tool run.
pub fn compose_grounded_messages_over(
    prompt: &PromptDefinition,
    working: &[Message],
    results: &[Message],
) -> AppResult<Vec<Message>> {
    let context = if results.is_empty() {
        None
    } else {
        Some(
            results
                .iter()
                .map(Message::content)
                .collect::<Vec<_>>()
                .join(CONTEXT_SEPARATOR),
        )
    };

    let grounded = build_grounded_prompt(prompt, context.as_deref())?;

    let mut messages = Vec::with_capacity(working.len() + 1);
    messages.push(Message::system(grounded.system));
    messages.extend(filtered_transcript(working));
    Ok(messages)
}
