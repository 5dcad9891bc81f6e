//! Demo command handler.
//!
//! Runs three scripted conversations, each in its own session.

use crate::commands::{build_assistant, print_json};
use clap::Args;
use groundwork_core::{config::AppConfig, AppResult};
use groundwork_knowledge::Mode;

const SCENARIOS: &[(&str, &str, Mode)] = &[
    (
        "Product discovery",
        "I need lightweight caps with UV protection for outdoor events. What do you have?",
        Mode::SinglePass,
    ),
    (
        "Pricing inquiry",
        "What's the cost for 100 navy blue trucker caps with embroidered patches?",
        Mode::Agent,
    ),
    (
        "Customization options",
        "Tell me about the different patch and embroidery options you offer.",
        Mode::SinglePass,
    ),
];

/// Run the scripted demo conversations
#[derive(Args, Debug)]
pub struct DemoCommand {
    /// Output each turn result as JSON
    #[arg(long)]
    pub json: bool,
}

impl DemoCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing demo command");

        let assistant = build_assistant(config).await?;

        for (n, (title, message, mode)) in SCENARIOS.iter().enumerate() {
            let session = format!("demo_customer_{}", n + 1);
            let result = assistant.respond(message, &session, *mode).await;

            if self.json {
                print_json(&result)?;
                continue;
            }

            println!("=== {} ({} mode) ===", title, mode);
            println!("customer> {}", message);
            println!("assistant> {}", result.response);
            println!(
                "data source: {} | status: {}\n",
                result.data_source, result.status_code
            );
        }

        Ok(())
    }
}
