//! Prompt system for Groundwork.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions with a built-in default
//! - Handlebars rendering of retrieved context into the system instruction

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_grounded_prompt;
pub use loader::{list_prompts, load_or_builtin, load_prompt};
pub use types::{GroundedPrompt, PromptDefinition, DEFAULT_PROMPT_ID};
