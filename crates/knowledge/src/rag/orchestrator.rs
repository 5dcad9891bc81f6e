//! Single-pass response orchestrator.
//!
//! A turn moves through a fixed state machine:
//!
//! ```text
//! AwaitQuery -> Decide -> Retrieve -> GenerateWithContext -> Done
//!                      \-> GenerateDirect ----------------/
//! ```
//!
//! `Decide` sends the session history with every retrieval tool bound. A
//! reply without tool calls is the answer; otherwise each requested tool runs
//! in order and one tool-free call produces the grounded answer. A turn
//! therefore makes one or two generation calls, never more.
//!
//! The orchestrator works on a copy of the history. The caller commits
//! [`TurnOutcome::new_messages`] only once the turn has completed.

use crate::rag::context::RagContext;
use crate::rag::types::{EMPTY_RESPONSE_FALLBACK, GENERATION_FALLBACK};
use groundwork_core::AppResult;
use groundwork_llm::{Message, ToolCall};

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final answer text
    pub answer: String,
    /// Messages to append to the session, starting with the user message
    pub new_messages: Vec<Message>,
    /// Generation-backend calls made
    pub generation_calls: u32,
}

impl TurnOutcome {
    pub(crate) fn from_working(
        answer: String,
        mut working: Vec<Message>,
        turn_start: usize,
        generation_calls: u32,
    ) -> Self {
        Self {
            answer,
            new_messages: working.split_off(turn_start),
            generation_calls,
        }
    }
}

#[derive(Debug)]
enum TurnState {
    AwaitQuery(String),
    Decide,
    Retrieve(Vec<ToolCall>),
    GenerateWithContext,
    GenerateDirect(String),
    Done(String),
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitQuery(_) => "await_query",
            Self::Decide => "decide",
            Self::Retrieve(_) => "retrieve",
            Self::GenerateWithContext => "generate_with_context",
            Self::GenerateDirect(_) => "generate_direct",
            Self::Done(_) => "done",
        }
    }
}

/// Run one single-pass turn over `history`.
///
/// Generation failures are recovered with fallback answers. Only transport
/// faults (timeouts) on the decide call are returned as errors.
pub async fn run_single_pass(
    ctx: &RagContext,
    history: &[Message],
    query: &str,
) -> AppResult<TurnOutcome> {
    let mut working = history.to_vec();
    let turn_start = working.len();
    let mut calls = 0u32;
    let mut state = TurnState::AwaitQuery(query.to_string());

    loop {
        tracing::debug!(state = state.name(), "Orchestrator state");

        state = match state {
            TurnState::AwaitQuery(query) => {
                working.push(Message::user(query));
                TurnState::Decide
            }

            TurnState::Decide => {
                calls += 1;
                match ctx.generate(working.clone(), true, "decide").await {
                    Ok(reply) if reply.requests_tools() => {
                        let requested = reply.tool_calls().to_vec();
                        tracing::info!(
                            tools = ?requested.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                            "Retrieval requested"
                        );
                        working.push(reply);
                        TurnState::Retrieve(requested)
                    }
                    Ok(reply) => TurnState::GenerateDirect(reply.content().to_string()),
                    Err(e) if e.is_transport() => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "Decide call failed, using fallback answer");
                        TurnState::GenerateDirect(EMPTY_RESPONSE_FALLBACK.to_string())
                    }
                }
            }

            TurnState::Retrieve(requested) => {
                ctx.run_tools(&requested, &mut working).await;
                TurnState::GenerateWithContext
            }

            TurnState::GenerateWithContext => {
                calls += 1;
                let answer = match ctx.grounded_answer(&working).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        tracing::warn!(error = %e, "Grounded generation failed, using fallback answer");
                        GENERATION_FALLBACK.to_string()
                    }
                };
                working.push(Message::assistant(answer.clone()));
                TurnState::Done(answer)
            }

            TurnState::GenerateDirect(answer) => {
                working.push(Message::assistant(answer.clone()));
                TurnState::Done(answer)
            }

            TurnState::Done(answer) => {
                return Ok(TurnOutcome::from_working(answer, working, turn_start, calls));
            }
        };
    }
}
