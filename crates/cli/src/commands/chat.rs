//! Chat command handler.
//!
//! Interactive conversation on stdin. `quit`, `exit` or `q` leave, `agent`
//! toggles agent mode and `clear` starts a fresh session.

use crate::commands::build_assistant;
use chrono::Utc;
use clap::Args;
use groundwork_core::{config::AppConfig, AppResult};
use groundwork_knowledge::Mode;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive conversation
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Start in agent mode
    #[arg(long)]
    pub agent: bool,

    /// Session identifier (default: a fresh one)
    #[arg(short, long)]
    pub session: Option<String>,
}

fn new_session_id() -> String {
    format!("session_{}", Utc::now().timestamp())
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let assistant = build_assistant(config).await?;
        let mut session = self.session.clone().unwrap_or_else(new_session_id);
        let mut mode = Mode::from_agent_flag(self.agent);

        println!("Type 'quit' to exit, 'agent' to toggle agent mode, 'clear' to start over.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("\n[{}] you> ", mode);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();

            match input.to_lowercase().as_str() {
                "" => continue,
                "quit" | "exit" | "q" => break,
                "agent" => {
                    mode = match mode {
                        Mode::SinglePass => Mode::Agent,
                        Mode::Agent => Mode::SinglePass,
                    };
                    println!("Switched to {} mode", mode);
                    continue;
                }
                "clear" => {
                    assistant.clear_conversation(&session).await;
                    session = new_session_id();
                    println!("Started a new conversation ({})", session);
                    continue;
                }
                _ => {}
            }

            let result = assistant.respond(input, &session, mode).await;
            println!("\nassistant> {}", result.response);
            println!("  (data source: {})", result.data_source);
            if let Some(ref error) = result.error {
                tracing::error!("Turn failed: {}", error);
            }
        }

        println!("{}", assistant.conversation_summary(&session).await);
        Ok(())
    }
}
