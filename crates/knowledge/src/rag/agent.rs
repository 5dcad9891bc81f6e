//! Agent mode: iterative retrieval.
//!
//! The generation backend may retrieve, read the results and retrieve
//! again until it answers without requesting tools. The loop makes at most
//! `maxAgentIterations` tool-enabled calls; when the bound is reached with
//! tools still being requested, one tool-free grounded call synthesizes an
//! answer from every tool result of the turn, in order. A turn thus makes at most
//! `maxAgentIterations + 1` generation calls.
//!
//! The overall deadline and caller cancellation are applied around this
//! loop by the facade.

use crate::rag::context::RagContext;
use crate::rag::orchestrator::TurnOutcome;
use crate::rag::types::GENERATION_FALLBACK;
use groundwork_core::AppResult;
use groundwork_llm::Message;

/// Run one agent-mode turn over `history`.
pub async fn run_agent(
    ctx: &RagContext,
    history: &[Message],
    query: &str,
) -> AppResult<TurnOutcome> {
    let mut working = history.to_vec();
    let turn_start = working.len();
    working.push(Message::user(query));

    let max_iterations = ctx.config.max_agent_iterations.max(1);
    let persona = Message::system(ctx.prompt.persona.trim());
    let mut calls = 0u32;

    let answer = loop {
        if calls >= max_iterations {
            tracing::warn!(
                iterations = calls,
                "Agent iteration bound reached, synthesizing from retrieved results"
            );
            calls += 1;
            let results: Vec<Message> = working[turn_start..]
                .iter()
                .filter(|m| m.is_tool())
                .cloned()
                .collect();
            let answer = ctx
                .grounded_answer_over(&working, &results)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Agent synthesis failed, using fallback answer");
                    GENERATION_FALLBACK.to_string()
                });
            working.push(Message::assistant(answer.clone()));
            break answer;
        }

        calls += 1;
        let mut request = Vec::with_capacity(working.len() + 1);
        request.push(persona.clone());
        request.extend(working.iter().cloned());

        match ctx.generate(request, true, "agent").await {
            Ok(reply) if reply.requests_tools() => {
                let requested = reply.tool_calls().to_vec();
                tracing::info!(
                    iteration = calls,
                    tools = ?requested.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                    "Agent requested retrieval"
                );
                working.push(reply);
                ctx.run_tools(&requested, &mut working).await;
            }
            Ok(reply) => {
                let answer = reply.content().to_string();
                working.push(Message::assistant(answer.clone()));
                break answer;
            }
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, iteration = calls, "Agent call failed, using fallback answer");
                working.push(Message::assistant(GENERATION_FALLBACK));
                break GENERATION_FALLBACK.to_string();
            }
        }
    };

    tracing::debug!(generation_calls = calls, "Agent turn finished");
    Ok(TurnOutcome::from_working(answer, working, turn_start, calls))
}
