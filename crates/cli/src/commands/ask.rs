//! Ask command handler.
//!
//! Answers one message in a session and prints the result.

use crate::commands::{build_assistant, print_json};
use clap::Args;
use groundwork_core::{config::AppConfig, AppResult};
use groundwork_knowledge::Mode;

/// Answer one message in a session
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The message to answer
    pub message: String,

    /// Session identifier
    #[arg(short, long, default_value = "default")]
    pub session: String,

    /// Use agent mode (iterative retrieval)
    #[arg(long)]
    pub agent: bool,

    /// Output the full turn result as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let assistant = build_assistant(config).await?;
        let result = assistant
            .respond(&self.message, &self.session, Mode::from_agent_flag(self.agent))
            .await;

        if self.json {
            print_json(&result)?;
        } else {
            println!("{}", result.response);
            tracing::debug!(
                data_source = %result.data_source,
                status = result.status_code,
                "Turn metadata"
            );
        }

        if let Some(ref error) = result.error {
            tracing::error!("Turn failed: {}", error);
        }

        Ok(())
    }
}
