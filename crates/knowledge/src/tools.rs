//! Retriever tool set.
//!
//! Each knowledge base is exposed to the generation backend as a named tool
//! taking a free-text `query`. A tool always produces a result: when its
//! backend is missing, fails or times out it returns a sentinel string and
//! no documents instead of an error, so the turn can continue.

use crate::backend::SimilarityBackend;
use crate::types::{DataSource, ExtraField, KnowledgeBaseConfig, RetrievedDocument};
use groundwork_llm::{Message, ToolCall, ToolSpec};
use std::sync::Arc;
use std::time::Duration;

/// Result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Serialized documents, or a sentinel when degraded
    pub content: String,
    pub documents: Vec<RetrievedDocument>,
    /// True when the backend could not be queried
    pub degraded: bool,
}

impl ToolOutput {
    fn degraded(content: String) -> Self {
        Self {
            content,
            documents: Vec::new(),
            degraded: true,
        }
    }

    /// Distinct data-source labels of the returned documents.
    pub fn provenance(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for doc in &self.documents {
            if !labels.contains(&doc.data_source) {
                labels.push(doc.data_source.clone());
            }
        }
        labels
    }
}

/// One knowledge base wrapped as an invokable tool.
pub struct RetrievalTool {
    name: String,
    description: String,
    display_name: String,
    source: DataSource,
    category_label: String,
    extra_fields: Vec<ExtraField>,
    backend: Option<Arc<dyn SimilarityBackend>>,
    top_k: usize,
    timeout: Duration,
}

impl RetrievalTool {
    /// Create a tool from its base config. `backend` is `None` when the base
    /// could not be opened.
    pub fn new(
        config: &KnowledgeBaseConfig,
        backend: Option<Arc<dyn SimilarityBackend>>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            name: config.tool_name.clone(),
            description: config.description.clone(),
            display_name: config.display_name.clone(),
            source: config.data_source(),
            category_label: config.category_label.clone(),
            extra_fields: config.extra_fields.clone(),
            backend,
            top_k: top_k.max(1),
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Descriptor bound to generation calls.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec::query_tool(&self.name, &self.description)
    }

    /// Run a top-k similarity search and serialize the hits.
    pub async fn search(&self, query: &str) -> ToolOutput {
        let Some(backend) = &self.backend else {
            return ToolOutput::degraded(format!("{} not available", self.display_name));
        };

        if query.trim().is_empty() {
            return ToolOutput::degraded(self.error_text("query must not be empty"));
        }

        let hits = match tokio::time::timeout(
            self.timeout,
            backend.similarity_search(query, self.top_k),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => return ToolOutput::degraded(self.error_text(&e.to_string())),
            Err(_) => {
                return ToolOutput::degraded(self.error_text(&format!(
                    "timed out after {}s",
                    self.timeout.as_secs_f32()
                )))
            }
        };

        if hits.is_empty() {
            return ToolOutput {
                content: format!("No matching documents found in {}", self.display_name),
                documents: Vec::new(),
                degraded: false,
            };
        }

        let documents: Vec<RetrievedDocument> = hits
            .into_iter()
            .map(|(doc, score)| RetrievedDocument {
                source: doc.source,
                category: doc.category,
                content: doc.content,
                metadata: doc.metadata,
                data_source: self.source.label.clone(),
                score,
            })
            .collect();

        let content = documents
            .iter()
            .map(|doc| self.serialize(doc))
            .collect::<Vec<_>>()
            .join("\n\n");

        ToolOutput {
            content,
            documents,
            degraded: false,
        }
    }

    fn error_text(&self, detail: &str) -> String {
        format!(
            "Error retrieving {}: {}",
            self.display_name.to_lowercase(),
            detail
        )
    }

    fn serialize(&self, doc: &RetrievedDocument) -> String {
        let mut block = format!(
            "Source: {}\n{}: {}\n",
            doc.source, self.category_label, doc.category
        );
        for field in &self.extra_fields {
            let value = match doc.metadata.get(&field.key) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => field.default.clone(),
                Some(other) => other.to_string(),
            };
            block.push_str(&format!("{}: {}\n", field.label, value));
        }
        block.push_str(&self.source.marker());
        block.push_str(&format!("\nContent: {}", doc.content));
        block
    }
}

/// The ordered set of tools offered to the generation backend.
#[derive(Default)]
pub struct ToolSet {
    tools: Vec<RetrievalTool>,
}

impl ToolSet {
    pub fn new(tools: Vec<RetrievalTool>) -> Self {
        Self { tools }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RetrievalTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(RetrievalTool::spec).collect()
    }

    /// Data sources in tool order.
    pub fn sources(&self) -> Vec<DataSource> {
        self.tools.iter().map(|t| t.source.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetrievalTool> {
        self.tools.iter()
    }

    /// Execute one tool call and wrap the result as a tool message.
    ///
    /// An unknown tool name still yields a tool message, so every requested
    /// call id is answered.
    pub async fn execute(&self, call: &ToolCall) -> Message {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!(tool = %call.name, "Generation backend requested an unknown tool");
            return Message::tool(
                &call.id,
                &call.name,
                format!("Error retrieving {}: unknown tool", call.name),
                Vec::new(),
            );
        };

        let query = call.argument_str("query").unwrap_or_default();
        let output = tool.search(query).await;

        if output.degraded {
            tracing::warn!(tool = %call.name, result = %output.content, "Retrieval degraded");
        } else {
            tracing::debug!(
                tool = %call.name,
                documents = output.documents.len(),
                "Retrieval completed"
            );
        }

        let provenance = output.provenance();
        Message::tool(&call.id, &call.name, output.content, provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StoredDocument;
    use groundwork_core::{AppError, AppResult};

    struct Fixed(Vec<StoredDocument>);

    #[async_trait::async_trait]
    impl SimilarityBackend for Fixed {
        async fn similarity_search(
            &self,
            _query: &str,
            k: usize,
        ) -> AppResult<Vec<(StoredDocument, f32)>> {
            Ok(self.0.iter().take(k).cloned().map(|d| (d, 0.9)).collect())
        }

        fn document_count(&self) -> usize {
            self.0.len()
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl SimilarityBackend for Failing {
        async fn similarity_search(
            &self,
            _query: &str,
            _k: usize,
        ) -> AppResult<Vec<(StoredDocument, f32)>> {
            Err(AppError::Knowledge("index offline".to_string()))
        }

        fn document_count(&self) -> usize {
            0
        }
    }

    fn product(id: &str, content: &str) -> StoredDocument {
        let mut metadata = serde_json::Map::new();
        metadata.insert("product_id".to_string(), serde_json::json!(id));
        StoredDocument {
            id: id.to_string(),
            content: content.to_string(),
            source: "catalog.json".to_string(),
            category: "Trucker".to_string(),
            metadata,
        }
    }

    fn call(name: &str, query: &str) -> ToolCall {
        let mut args = serde_json::Map::new();
        args.insert("query".to_string(), serde_json::json!(query));
        ToolCall::new("call_1", name, args)
    }

    #[tokio::test]
    async fn test_serialization_format() {
        let tool = RetrievalTool::new(
            &KnowledgeBaseConfig::preset("catalog"),
            Some(Arc::new(Fixed(vec![
                product("i8505", "Navy trucker"),
                StoredDocument {
                    metadata: serde_json::Map::new(),
                    ..product("x", "Foam trucker")
                },
            ]))),
            3,
            Duration::from_secs(5),
        );

        let output = tool.search("navy trucker").await;
        assert!(!output.degraded);
        assert_eq!(
            output.content,
            "Source: catalog.json\nCategory: Trucker\nProduct ID: i8505\nData Source: Product Catalog\nContent: Navy trucker\n\n\
             Source: catalog.json\nCategory: Trucker\nProduct ID: N/A\nData Source: Product Catalog\nContent: Foam trucker"
        );
        assert_eq!(output.provenance(), vec!["catalog".to_string()]);
    }

    #[tokio::test]
    async fn test_website_blocks_label_category_as_type() {
        let tool = RetrievalTool::new(
            &KnowledgeBaseConfig::preset("website"),
            Some(Arc::new(Fixed(vec![StoredDocument {
                id: "w1".to_string(),
                content: "Free shipping over 48 caps".to_string(),
                source: "faq.csv".to_string(),
                category: "Shipping".to_string(),
                metadata: serde_json::Map::new(),
            }]))),
            3,
            Duration::from_secs(5),
        );

        let output = tool.search("shipping").await;
        assert_eq!(
            output.content,
            "Source: faq.csv\nType: Shipping\nData Source: Website/CSV\nContent: Free shipping over 48 caps"
        );
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let docs = (0..5).map(|i| product(&i.to_string(), "cap")).collect();
        let tool = RetrievalTool::new(
            &KnowledgeBaseConfig::preset("catalog"),
            Some(Arc::new(Fixed(docs))),
            3,
            Duration::from_secs(5),
        );
        assert_eq!(tool.search("cap").await.documents.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_backend_sentinel() {
        let tool = RetrievalTool::new(
            &KnowledgeBaseConfig::preset("website"),
            None,
            3,
            Duration::from_secs(5),
        );
        let output = tool.search("returns policy").await;
        assert!(output.degraded);
        assert_eq!(output.content, "Website data not available");
        assert!(output.provenance().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_sentinel() {
        let tool = RetrievalTool::new(
            &KnowledgeBaseConfig::preset("catalog"),
            Some(Arc::new(Failing)),
            3,
            Duration::from_secs(5),
        );
        let output = tool.search("visors").await;
        assert!(output.degraded);
        assert!(output
            .content
            .starts_with("Error retrieving product catalog: "));
        assert!(output.content.contains("index offline"));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let tools = ToolSet::new(vec![]);
        let message = tools.execute(&call("retrieve_weather", "rain")).await;
        match message {
            Message::Tool {
                tool_call_id,
                content,
                provenance,
                ..
            } => {
                assert_eq!(tool_call_id, "call_1");
                assert!(content.contains("unknown tool"));
                assert!(provenance.is_empty());
            }
            other => panic!("expected tool message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_carries_provenance() {
        let tools = ToolSet::new(vec![RetrievalTool::new(
            &KnowledgeBaseConfig::preset("catalog"),
            Some(Arc::new(Fixed(vec![product("i3057", "Snapback")]))),
            3,
            Duration::from_secs(5),
        )]);

        let message = tools
            .execute(&call("retrieve_product_catalog", "snapback"))
            .await;
        assert_eq!(message.provenance(), ["catalog".to_string()]);
        assert_eq!(tools.specs()[0].name, "retrieve_product_catalog");
    }
}
