//! Conversational facade.
//!
//! [`Assistant::respond`] is the single entry point for a turn. It locks the
//! caller's session, runs the orchestrator selected by [`Mode`], attributes
//! the answer to its data sources and commits the turn to history. It never
//! fails: every fault becomes a [`TurnResult`] with a failure status and a
//! user-safe apology, with the detail kept in `error`.

use crate::rag::agent::run_agent;
use crate::rag::attribution::attribute;
use crate::rag::context::RagContext;
use crate::rag::orchestrator::{run_single_pass, TurnOutcome};
use crate::rag::session::{thread_key, SessionStore};
use crate::rag::types::{
    DataSourceLabel, Mode, TurnResult, EMPTY_RESPONSE_FALLBACK, TRANSPORT_APOLOGY,
    UNEXPECTED_APOLOGY,
};
use futures::FutureExt;
use groundwork_core::{AppError, AppResult};
use groundwork_llm::Message;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub struct Assistant {
    ctx: Arc<RagContext>,
    sessions: SessionStore,
}

impl Assistant {
    pub fn new(ctx: RagContext) -> Self {
        let sessions = SessionStore::from_config(&ctx.config);
        Self {
            ctx: Arc::new(ctx),
            sessions,
        }
    }

    pub fn context(&self) -> &RagContext {
        &self.ctx
    }

    /// Answer one message in the given session.
    pub async fn respond(&self, message: &str, session_id: &str, mode: Mode) -> TurnResult {
        self.respond_with_cancel(message, session_id, mode, CancellationToken::new())
            .await
    }

    /// Like [`respond`](Self::respond), aborting when `cancel` fires.
    ///
    /// A cancelled or timed-out turn leaves the session history untouched.
    pub async fn respond_with_cancel(
        &self,
        message: &str,
        session_id: &str,
        mode: Mode,
        cancel: CancellationToken,
    ) -> TurnResult {
        let span = tracing::info_span!("turn", session = %session_id, mode = %mode);

        let outcome = AssertUnwindSafe(self.run_turn(message, session_id, mode, &cancel))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        span.in_scope(|| match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_transport() => {
                tracing::error!(error = %e, "Turn failed");
                TurnResult::failure(session_id, message, TRANSPORT_APOLOGY, mode, e.to_string())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Unexpected error in turn");
                TurnResult::failure(session_id, message, UNEXPECTED_APOLOGY, mode, e.to_string())
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                tracing::error!(panic = %detail, "Turn panicked");
                TurnResult::failure(session_id, message, UNEXPECTED_APOLOGY, mode, detail)
            }
        })
    }

    async fn run_turn(
        &self,
        message: &str,
        session_id: &str,
        mode: Mode,
        cancel: &CancellationToken,
    ) -> AppResult<TurnResult> {
        if message.trim().is_empty() {
            return Err(AppError::Other("Message must not be empty".to_string()));
        }

        let mut session = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::Cancelled("turn cancelled while waiting for session".to_string()));
            }
            session = self.sessions.acquire(session_id) => session?,
        };

        tracing::info!(thread = %session.thread_key, history = session.history.len(), "Turn started");

        let outcome: TurnOutcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(AppError::Cancelled("turn cancelled by caller".to_string()));
            }
            outcome = self.orchestrate(&session.history, message, mode) => outcome?,
        };

        let mut data_source = attribute(&outcome.new_messages, &self.ctx.tools.sources());
        let mut response = outcome.answer;
        if response.trim().is_empty() {
            tracing::warn!("Turn produced no answer text, using fallback");
            response = EMPTY_RESPONSE_FALLBACK.to_string();
            data_source = DataSourceLabel::None;
        }

        tracing::info!(
            generation_calls = outcome.generation_calls,
            data_source = %data_source,
            "Turn completed"
        );

        session.history.extend(outcome.new_messages);

        Ok(TurnResult::success(session_id, message, response, mode, data_source))
    }

    async fn orchestrate(
        &self,
        history: &[Message],
        message: &str,
        mode: Mode,
    ) -> AppResult<TurnOutcome> {
        match mode {
            Mode::SinglePass => run_single_pass(&self.ctx, history, message).await,
            Mode::Agent => {
                let deadline = self.ctx.config.agent_deadline();
                tokio::time::timeout(deadline, run_agent(&self.ctx, history, message))
                    .await
                    .map_err(|_| {
                        AppError::Timeout(format!(
                            "agent turn exceeded {}s",
                            deadline.as_secs_f32()
                        ))
                    })?
            }
        }
    }

    /// Forget a session's history, after any turn in flight on it.
    pub async fn clear_conversation(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).await;
        tracing::info!(session = %session_id, removed, "Cleared conversation");
        removed
    }

    /// One-line description of a session's thread.
    pub async fn conversation_summary(&self, session_id: &str) -> String {
        let history = self.sessions.history(session_id).await;
        let turns = history
            .iter()
            .filter(|m| matches!(m, Message::User { .. }))
            .count();
        format!(
            "Conversation thread: {} - {} turn(s), {} message(s)",
            thread_key(session_id),
            turns,
            history.len()
        )
    }

    /// Snapshot of a session's committed history.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions.history(session_id).await
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic: unknown payload".to_string()
    }
}
