//! Knowledge bases on disk feeding the tool set.

use crate::{build_tool_set, config, import_documents, list_bases, stats};
use groundwork_core::RagConfig;
use groundwork_llm::ToolCall;
use std::fs;
use tempfile::TempDir;

fn write_catalog(temp: &TempDir) -> std::path::PathBuf {
    let path = temp.path().join("catalog.jsonl");
    fs::write(
        &path,
        r#"{"id":"i7041","content":"Lightweight performance cap with UV protection for outdoor events","category":"Performance","product_id":"i7041"}
{"id":"i8505","content":"Navy blue trucker cap with mesh back and foam front","category":"Trucker","product_id":"i8505"}
{"id":"p1","content":"Embroidered patches from $2.50 per piece at 100 units","category":"Decoration"}
"#,
    )
    .unwrap();
    path
}

fn query(name: &str, text: &str) -> ToolCall {
    let mut args = serde_json::Map::new();
    args.insert("query".to_string(), serde_json::json!(text));
    ToolCall::new("call_1", name, args)
}

#[tokio::test]
async fn test_imported_base_answers_queries() {
    let temp = TempDir::new().unwrap();
    import_documents(temp.path(), "catalog", &write_catalog(&temp), false).unwrap();

    let tools = build_tool_set(temp.path(), &RagConfig::default(), None)
        .await
        .unwrap();

    let catalog = tools.get("retrieve_product_catalog").unwrap();
    assert!(catalog.is_available());
    assert!(!tools.get("retrieve_website_data").unwrap().is_available());

    let output = catalog.search("navy trucker cap").await;
    assert!(!output.degraded);
    assert_eq!(output.documents.len(), 3);
    assert_eq!(output.documents[0].metadata["product_id"], "i8505");
    assert!(output.content.contains("Product ID: i8505"));

    let message = tools
        .execute(&query("retrieve_website_data", "shipping"))
        .await;
    assert_eq!(message.content(), "Website data not available");
    assert!(message.provenance().is_empty());
}

#[tokio::test]
async fn test_per_base_top_k_override() {
    let temp = TempDir::new().unwrap();
    import_documents(temp.path(), "catalog", &write_catalog(&temp), false).unwrap();

    let mut base = config::load_config(temp.path(), "catalog").unwrap();
    base.top_k = Some(1);
    config::save_config(temp.path(), &base).unwrap();

    let rag = RagConfig {
        sources: vec!["catalog".to_string()],
        ..RagConfig::default()
    };
    let tools = build_tool_set(temp.path(), &rag, None).await.unwrap();

    let output = tools
        .get("retrieve_product_catalog")
        .unwrap()
        .search("patches")
        .await;
    assert_eq!(output.documents.len(), 1);
}

#[tokio::test]
async fn test_broken_base_degrades_to_unavailable() {
    let temp = TempDir::new().unwrap();
    import_documents(temp.path(), "catalog", &write_catalog(&temp), false).unwrap();

    let mut base = config::load_config(temp.path(), "catalog").unwrap();
    base.embedding.provider = "nonexistent".to_string();
    config::save_config(temp.path(), &base).unwrap();

    let tools = build_tool_set(temp.path(), &RagConfig::default(), None)
        .await
        .unwrap();
    assert!(!tools.get("retrieve_product_catalog").unwrap().is_available());
}

#[test]
fn test_list_bases() {
    let temp = TempDir::new().unwrap();
    assert!(list_bases(temp.path()).unwrap().is_empty());

    import_documents(temp.path(), "catalog", &write_catalog(&temp), false).unwrap();

    let bases = list_bases(temp.path()).unwrap();
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].base_name, "catalog");
    assert_eq!(bases[0].tool_name, "retrieve_product_catalog");
    assert_eq!(bases[0].documents_count, 3);
    assert_eq!(bases[0].embedding_provider, "mock");
    assert!(bases[0].last_import_at.is_some());

    assert_eq!(stats(temp.path(), "catalog").unwrap().label, "catalog");
}
