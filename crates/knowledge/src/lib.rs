//! Knowledge bases and the conversational retrieval layer.
//!
//! Each knowledge base is a set of documents under
//! `.groundwork/knowledge/<base>/`, embedded into an in-memory index at
//! startup and exposed to the generation backend as a retrieval tool. The
//! [`rag`] module builds grounded, session-aware answers on top of them.

pub mod backend;
pub mod config;
pub mod embeddings;
pub mod ingest;
pub mod rag;
pub mod tools;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use backend::{EmbeddedIndex, SimilarityBackend};
pub use ingest::{import_documents, load_documents};
pub use rag::{Assistant, DataSourceLabel, Mode, RagContext, TurnResult};
pub use tools::{RetrievalTool, ToolOutput, ToolSet};
pub use types::{
    BaseStats, DataSource, ImportStats, KnowledgeBaseConfig, RetrievedDocument, StoredDocument,
};

use chrono::{DateTime, Utc};
use groundwork_core::{AppResult, RagConfig};
use std::path::Path;
use std::sync::Arc;

/// Open the similarity backend of one base.
///
/// Returns `None` when the base holds no documents.
pub async fn open_backend(
    workspace: &Path,
    config: &KnowledgeBaseConfig,
    api_key: Option<&str>,
) -> AppResult<Option<Arc<dyn SimilarityBackend>>> {
    let documents = load_documents(workspace, &config.name)?;
    if documents.is_empty() {
        tracing::info!("Knowledge base '{}' has no documents", config.name);
        return Ok(None);
    }

    let provider = embeddings::create_provider(&config.embedding, api_key).await?;
    let index = EmbeddedIndex::build(provider, documents, config.embedding.batch_size).await?;

    tracing::info!(
        "Opened knowledge base '{}' ({} documents)",
        config.name,
        index.document_count()
    );
    Ok(Some(Arc::new(index)))
}

/// Build the retrieval tool set for the configured sources, in order.
///
/// A base that cannot be opened still gets a tool; it answers with the
/// "not available" sentinel.
pub async fn build_tool_set(
    workspace: &Path,
    rag: &RagConfig,
    api_key: Option<&str>,
) -> AppResult<ToolSet> {
    let mut tools = Vec::with_capacity(rag.sources.len());

    for name in &rag.sources {
        let config = config::load_config(workspace, name)?;
        let backend = match open_backend(workspace, &config, api_key).await {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!("Knowledge base '{}' unavailable: {}", name, e);
                None
            }
        };

        tools.push(RetrievalTool::new(
            &config,
            backend,
            config.top_k.unwrap_or(rag.top_k),
            rag.backend_timeout(),
        ));
    }

    Ok(ToolSet::new(tools))
}

/// Statistics for every knowledge base on disk.
pub fn list_bases(workspace: &Path) -> AppResult<Vec<BaseStats>> {
    config::list_base_names(workspace)?
        .into_iter()
        .map(|name| stats(workspace, &name))
        .collect()
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let config = config::load_config(workspace, base_name)?;
    let documents = load_documents(workspace, base_name)?;

    let last_import_at = std::fs::metadata(config::get_documents_path(workspace, base_name))
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        tool_name: config.tool_name,
        label: config.label,
        documents_count: documents.len(),
        embedding_provider: config.embedding.provider,
        last_import_at,
    })
}
