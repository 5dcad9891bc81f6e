//! Knowledge command handler.
//!
//! Handles knowledge base import and listing.

use clap::{Args, Subcommand};
use groundwork_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Knowledge base management
#[derive(Args, Debug)]
pub struct KnowledgeCommand {
    #[command(subcommand)]
    pub action: KnowledgeAction,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Import documents (JSONL or JSON array) into a base
    Import(KnowledgeImportCommand),
    /// List knowledge bases
    List(KnowledgeListCommand),
}

/// Import documents into a base
#[derive(Args, Debug)]
pub struct KnowledgeImportCommand {
    /// Knowledge base name
    pub base: String,

    /// File to import
    pub file: PathBuf,

    /// Remove existing documents first
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeImportCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge import command for base '{}'", self.base);

        let stats = groundwork_knowledge::import_documents(
            &config.workspace,
            &self.base,
            &self.file,
            self.reset,
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Imported {} records into '{}' ({} replaced, {} total) in {:.2}s",
                stats.imported, stats.base_name, stats.replaced, stats.total, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// List knowledge bases
#[derive(Args, Debug)]
pub struct KnowledgeListCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeListCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge list command");

        let bases = groundwork_knowledge::list_bases(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&bases)?);
            return Ok(());
        }

        if bases.is_empty() {
            println!("No knowledge bases. Use 'groundwork knowledge import' to create one.");
            return Ok(());
        }

        for base in &bases {
            let sourced = if config.rag.sources.contains(&base.base_name) {
                "active"
            } else {
                "inactive"
            };
            println!("{} ({})", base.base_name, sourced);
            println!("  Tool: {}", base.tool_name);
            println!("  Label: {}", base.label);
            println!("  Documents: {}", base.documents_count);
            println!("  Embeddings: {}", base.embedding_provider);
            if let Some(last_import) = base.last_import_at {
                println!("  Last import: {}", last_import);
            }
        }

        Ok(())
    }
}

impl KnowledgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KnowledgeAction::Import(cmd) => cmd.execute(config),
            KnowledgeAction::List(cmd) => cmd.execute(config),
        }
    }
}
