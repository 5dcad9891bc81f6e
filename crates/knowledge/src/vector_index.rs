//! Vector index abstraction for knowledge documents.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval, plus
//! the in-memory cosine-similarity index used at runtime.

use crate::types::StoredDocument;
use groundwork_core::{AppError, AppResult};

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Insert or replace a document with its embedding.
    fn upsert(&mut self, document: StoredDocument, embedding: Vec<f32>) -> AppResult<()>;

    /// Search for the top-k most similar documents to the query embedding.
    ///
    /// Returns documents ordered by descending similarity score.
    fn search(&self, query_embedding: &[f32], top_k: usize)
        -> AppResult<Vec<(StoredDocument, f32)>>;

    /// Number of indexed documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all documents.
    fn reset(&mut self);
}

/// Brute-force in-memory index.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    dimensions: usize,
    entries: Vec<(StoredDocument, Vec<f32>)>,
}

impl MemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl VectorIndex for MemoryIndex {
    fn upsert(&mut self, document: StoredDocument, embedding: Vec<f32>) -> AppResult<()> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Embedding for document '{}' has {} dimensions, index expects {}",
                document.id,
                embedding.len(),
                self.dimensions
            )));
        }

        match self.entries.iter_mut().find(|(d, _)| d.id == document.id) {
            Some(slot) => *slot = (document, embedding),
            None => self.entries.push((document, embedding)),
        }
        Ok(())
    }

    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query embedding has {} dimensions, index expects {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, embedding))| (i, cosine_similarity(query_embedding, embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(i, score)| (self.entries[i].0.clone(), score))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn reset(&mut self) {
        self.entries.clear();
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, content: &str) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            content: content.to_string(),
            source: "test.json".to_string(),
            category: "product".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_ranking_and_top_k() {
        let mut index = MemoryIndex::new(3);
        index.upsert(doc("a", "trucker"), vec![1.0, 0.0, 0.0]).unwrap();
        index.upsert(doc("b", "visor"), vec![0.0, 1.0, 0.0]).unwrap();
        index.upsert(doc("c", "snapback"), vec![0.7, 0.7, 0.0]).unwrap();

        let results = index.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "a");
        assert_eq!(results[1].0.id, "c");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut index = MemoryIndex::new(2);
        index.upsert(doc("a", "old"), vec![1.0, 0.0]).unwrap();
        index.upsert(doc("a", "new"), vec![0.0, 1.0]).unwrap();

        assert_eq!(index.len(), 1);
        let results = index.search(&[0.0, 1.0], 5).unwrap();
        assert_eq!(results[0].0.content, "new");
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = MemoryIndex::new(2);
        assert!(index.upsert(doc("a", "x"), vec![1.0]).is_err());
        assert!(index.search(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_reset_and_zero_vectors() {
        let mut index = MemoryIndex::new(2);
        index.upsert(doc("a", "x"), vec![0.0, 0.0]).unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 1).unwrap()[0].1, 0.0);

        index.reset();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0], 3).unwrap().is_empty());
    }
}
