//! Similarity-search backends behind the retrieval tools.

use crate::embeddings::EmbeddingProvider;
use crate::types::StoredDocument;
use crate::vector_index::{MemoryIndex, VectorIndex};
use groundwork_core::{AppError, AppResult};
use std::sync::Arc;

/// A store that answers top-k similarity queries over text.
#[async_trait::async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Return up to `k` documents closest to `query`, best first.
    async fn similarity_search(&self, query: &str, k: usize)
        -> AppResult<Vec<(StoredDocument, f32)>>;

    /// Number of searchable documents.
    fn document_count(&self) -> usize;
}

/// Embedding provider paired with an in-memory vector index.
pub struct EmbeddedIndex {
    provider: Arc<dyn EmbeddingProvider>,
    index: MemoryIndex,
}

impl EmbeddedIndex {
    /// Embed `documents` and build the index.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        documents: Vec<StoredDocument>,
        batch_size: usize,
    ) -> AppResult<Self> {
        let mut index = MemoryIndex::new(provider.dimensions());

        for batch in documents.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embeddings = provider.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Embedding provider returned {} vectors for {} documents",
                    embeddings.len(),
                    batch.len()
                )));
            }
            for (document, embedding) in batch.iter().cloned().zip(embeddings) {
                index.upsert(document, embedding)?;
            }
        }

        tracing::debug!(
            documents = index.len(),
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Built in-memory similarity index"
        );

        Ok(Self { provider, index })
    }
}

#[async_trait::async_trait]
impl SimilarityBackend for EmbeddedIndex {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>> {
        let embedding = self.provider.embed(query).await?;
        self.index.search(&embedding, k)
    }

    fn document_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;

    fn doc(id: &str, content: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            content: content.to_string(),
            source: "catalog.json".to_string(),
            category: "cap".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_embedded_index_search() {
        let provider = Arc::new(MockProvider::new(256));
        let documents = vec![
            doc("1", "Performance cap with UV protection and moisture wicking"),
            doc("2", "Foam trucker cap with mesh back and snap closure"),
            doc("3", "Genuine leather patch decoration pricing"),
        ];

        let backend = EmbeddedIndex::build(provider, documents, 2).await.unwrap();
        assert_eq!(backend.document_count(), 3);

        let results = backend
            .similarity_search("foam trucker mesh", 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "2");
    }
}
