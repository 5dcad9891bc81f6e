//! Conversational retrieval layer.
//!
//! Turns a user message into a grounded answer: the session store keeps
//! each conversation's history, the orchestrators decide whether and what
//! to retrieve, and attribution labels the answer with its data sources.

pub mod agent;
pub mod assistant;
pub mod attribution;
pub mod context;
pub mod orchestrator;
pub mod session;
pub mod types;

pub use assistant::Assistant;
pub use attribution::attribute;
pub use context::RagContext;
pub use orchestrator::TurnOutcome;
pub use session::SessionStore;
pub use types::{DataSourceLabel, Mode, TurnResult};
