//! Conversational turn types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer used when the grounded generation call fails.
pub const GENERATION_FALLBACK: &str = "I'm here to support you, but I'm experiencing some technical difficulties right now. Please try rephrasing your question or contact support if the issue persists.";

/// Answer used when a turn produced no text, or the decide call failed.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I'm here to help, but I'm having trouble processing your message right now. Could you please try rephrasing your question?";

/// Answer used when the turn fails at the transport level.
pub const TRANSPORT_APOLOGY: &str =
    "I'm experiencing some technical difficulties. Please try again or rephrase your question.";

/// Answer used for any other failure caught at the facade.
pub const UNEXPECTED_APOLOGY: &str = "I apologize, but I encountered an error while processing your message. Please try again. If the problem persists, please contact support.";

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 500;

/// Orchestration strategy for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// At most one retrieval round and two generation calls
    #[default]
    SinglePass,
    /// Iterative retrieval, bounded by `maxAgentIterations`
    Agent,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SinglePass => "single_pass",
            Self::Agent => "agent",
        }
    }

    pub fn from_agent_flag(agent: bool) -> Self {
        if agent {
            Self::Agent
        } else {
            Self::SinglePass
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which data sources contributed to an answer.
///
/// Serialized as `"none"`, the source's label, or `"both"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataSourceLabel {
    #[default]
    None,
    Source(String),
    /// Two or more distinct sources
    Both,
}

impl DataSourceLabel {
    /// Whether `label` would read back as something other than a single
    /// source.
    pub fn is_reserved(label: &str) -> bool {
        matches!(label, "" | "none" | "both")
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Source(label) => label,
            Self::Both => "both",
        }
    }
}

impl From<String> for DataSourceLabel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "none" | "" => Self::None,
            "both" => Self::Both,
            _ => Self::Source(value),
        }
    }
}

impl From<DataSourceLabel> for String {
    fn from(value: DataSourceLabel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataSourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one `respond` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub session_id: String,
    pub query: String,
    /// User-safe answer text; never carries internal error detail
    pub response: String,
    pub mode: Mode,
    pub data_source: DataSourceLabel,
    pub timestamp: DateTime<Utc>,
    pub status_code: u16,
    /// Diagnostic detail for failed turns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnResult {
    pub fn success(
        session_id: &str,
        query: &str,
        response: String,
        mode: Mode,
        data_source: DataSourceLabel,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            query: query.to_string(),
            response,
            mode,
            data_source,
            timestamp: Utc::now(),
            status_code: STATUS_OK,
            error: None,
        }
    }

    pub fn failure(
        session_id: &str,
        query: &str,
        apology: &str,
        mode: Mode,
        error: String,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            query: query.to_string(),
            response: apology.to_string(),
            mode,
            data_source: DataSourceLabel::None,
            timestamp: Utc::now(),
            status_code: STATUS_FAILED,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_result_json_shape() {
        let result = TurnResult::success(
            "abc",
            "navy caps?",
            "We have navy caps.".to_string(),
            Mode::SinglePass,
            DataSourceLabel::Source("catalog".to_string()),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mode"], "single_pass");
        assert_eq!(json["data_source"], "catalog");
        assert_eq!(json["status_code"], 200);
        assert!(json.get("error").is_none());

        let back: TurnResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_failure_keeps_detail_out_of_response() {
        let result = TurnResult::failure(
            "abc",
            "hi",
            TRANSPORT_APOLOGY,
            Mode::Agent,
            "Timed out: decide call".to_string(),
        );
        assert!(!result.is_success());
        assert_eq!(result.response, TRANSPORT_APOLOGY);
        assert_eq!(result.data_source, DataSourceLabel::None);
        assert!(result.error.as_deref().unwrap().contains("Timed out"));
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(DataSourceLabel::from("both".to_string()), DataSourceLabel::Both);
        assert_eq!(DataSourceLabel::from("none".to_string()), DataSourceLabel::None);
        assert_eq!(DataSourceLabel::Source("website".into()).to_string(), "website");
        assert_eq!(Mode::from_agent_flag(true), Mode::Agent);
    }
}
