//! Knowledge system type definitions.

use crate::embeddings::EmbeddingConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for a knowledge base exposed as a retrieval tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    pub name: String,

    /// Tool name the generation backend calls
    pub tool_name: String,

    /// When-to-use description shown to the generation backend
    pub description: String,

    /// Human-readable name used in degraded results
    pub display_name: String,

    /// Data-source label reported on turn results
    pub label: String,

    /// Literal tag written into every serialized document block
    pub tag: String,

    /// Label of the category line in each block
    #[serde(default = "default_category_label")]
    pub category_label: String,

    /// Metadata fields rendered as extra lines in each block
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,

    /// Embedding settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Per-base override of the retrieval depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

/// A metadata field printed as `<label>: <value>` in a document block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraField {
    pub key: String,
    pub label: String,
    #[serde(default = "default_missing")]
    pub default: String,
}

fn default_category_label() -> String {
    "Category".to_string()
}

fn default_missing() -> String {
    "N/A".to_string()
}

impl KnowledgeBaseConfig {
    /// Preset configuration for a base name.
    ///
    /// `website` and `catalog` carry the assistant's standard tool
    /// descriptions; any other name gets a generic one.
    pub fn preset(name: &str) -> Self {
        match name {
            "website" => Self {
                name: name.to_string(),
                tool_name: "retrieve_website_data".to_string(),
                description: "Retrieve website content and structured data about the company, services, and general information.".to_string(),
                display_name: "Website data".to_string(),
                label: "website".to_string(),
                tag: "Website/CSV".to_string(),
                category_label: "Type".to_string(),
                extra_fields: Vec::new(),
                embedding: EmbeddingConfig::default(),
                top_k: None,
            },
            "catalog" => Self {
                name: name.to_string(),
                tool_name: "retrieve_product_catalog".to_string(),
                description: "Retrieve headwear product catalog information including caps, pricing, features, colors, customization options, and decoration pricing.".to_string(),
                display_name: "Product catalog".to_string(),
                label: "catalog".to_string(),
                tag: "Product Catalog".to_string(),
                category_label: default_category_label(),
                extra_fields: vec![ExtraField {
                    key: "product_id".to_string(),
                    label: "Product ID".to_string(),
                    default: default_missing(),
                }],
                embedding: EmbeddingConfig::default(),
                top_k: None,
            },
            other => Self {
                name: other.to_string(),
                tool_name: format!("retrieve_{}", other.replace(['-', ' '], "_")),
                description: format!("Retrieve information from the {} knowledge base.", other),
                display_name: format!("{} knowledge base", other),
                label: other.to_string(),
                tag: other.to_string(),
                category_label: default_category_label(),
                extra_fields: Vec::new(),
                embedding: EmbeddingConfig::default(),
                top_k: None,
            },
        }
    }

    /// Structured data-source identity of this base.
    pub fn data_source(&self) -> DataSource {
        DataSource {
            label: self.label.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Identity of one retrieval backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSource {
    /// Label used in attribution (`website`, `catalog`, ...)
    pub label: String,

    /// Literal text emitted as `Data Source: <tag>`
    pub tag: String,
}

impl DataSource {
    /// The exact line every serialized block of this source contains.
    pub fn marker(&self) -> String {
        format!("Data Source: {}", self.tag)
    }
}

/// A document stored in a knowledge base (documents.jsonl).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Unique document identifier
    pub id: String,

    /// Text content
    pub content: String,

    /// Where the document came from (file name, URL, record id)
    #[serde(default = "default_unknown")]
    pub source: String,

    /// Category or type label
    #[serde(default = "default_unknown")]
    pub category: String,

    /// Any additional record fields
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_unknown() -> String {
    "Unknown".to_string()
}

/// A document returned by one retrieval call.
///
/// Lives only for the turn that produced it, apart from its serialized form
/// inside a tool message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub source: String,
    pub category: String,
    pub content: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Label of the backend that answered
    pub data_source: String,

    /// Similarity score
    pub score: f32,
}

/// Statistics from an import operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub base_name: String,

    /// Records read from the input file
    pub imported: usize,

    /// Records replaced because their id already existed
    pub replaced: usize,

    /// Documents stored after the import
    pub total: usize,

    pub duration_secs: f64,
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    pub base_name: String,
    pub tool_name: String,
    pub label: String,
    pub documents_count: usize,
    pub embedding_provider: String,
    pub last_import_at: Option<DateTime<Utc>>,
}
