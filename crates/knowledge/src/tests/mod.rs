//! Pipeline tests for the conversational retrieval layer.

mod agent;
mod bases;
mod support;
