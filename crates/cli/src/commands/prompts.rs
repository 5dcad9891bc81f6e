//! Prompts command handler.

use clap::Args;
use groundwork_core::{config::AppConfig, AppResult};
use groundwork_prompt::list_prompts;

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let prompts = list_prompts(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&prompts)?);
        } else {
            for id in &prompts {
                let marker = if *id == config.rag.prompt_id { "*" } else { " " };
                println!("{} {}", marker, id);
            }
        }

        Ok(())
    }
}
