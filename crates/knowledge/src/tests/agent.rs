//! Agent-mode turns through the facade.

use super::support::*;
use crate::rag::types::{DataSourceLabel, Mode, GENERATION_FALLBACK, STATUS_FAILED, STATUS_OK};
use groundwork_core::RagConfig;
use groundwork_llm::{Message, Role};

#[tokio::test]
async fn test_agent_retrieves_repeatedly() {
    let llm = ScriptedLlm::new(vec![
        Reply::Tools(vec![("retrieve_product_catalog", "navy trucker")]),
        Reply::Tools(vec![("retrieve_website_data", "embroidered patch pricing")]),
        Reply::Answer("100 navy truckers with patches come to $650."),
    ]);
    let assistant = assistant(&llm, stocked_tools());

    let result = assistant
        .respond(
            "What's the cost for 100 navy blue trucker caps with embroidered patches?",
            "s1",
            Mode::Agent,
        )
        .await;

    assert_eq!(result.status_code, STATUS_OK);
    assert_eq!(result.mode, Mode::Agent);
    assert_eq!(result.data_source, DataSourceLabel::Both);
    assert_eq!(result.response, "100 navy truckers with patches come to $650.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.has_tools()));

    // Each call sees the persona and every earlier result of the turn
    assert!(matches!(requests[0].messages[0], Message::System { .. }));
    let third: Vec<Role> = requests[2].messages.iter().map(Message::role).collect();
    assert_eq!(
        third,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
            Role::Tool
        ]
    );

    // The persona is not committed to history
    let history = assistant.history("s1").await;
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].role(), Role::User);
}

#[tokio::test]
async fn test_agent_iteration_bound() {
    let llm = ScriptedLlm::new(vec![
        Reply::Tools(vec![("retrieve_product_catalog", "caps")]),
        Reply::Tools(vec![("retrieve_website_data", "caps")]),
        Reply::Answer("Here is what I found."),
    ]);
    let config = RagConfig {
        max_agent_iterations: 2,
        ..RagConfig::default()
    };
    let assistant = assistant_with(&llm, stocked_tools(), config);

    let result = assistant.respond("tell me about caps", "s1", Mode::Agent).await;

    assert_eq!(result.status_code, STATUS_OK);
    assert_eq!(result.response, "Here is what I found.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);

    // The synthesis call is tool-free and grounded on every result of the turn
    let last = &requests[2];
    assert!(!last.has_tools());
    let system = system_text(last);
    let catalog = system.find("Data Source: Product Catalog").unwrap();
    let website = system.find("Data Source: Website/CSV").unwrap();
    assert!(catalog < website);
    assert!(system.contains("Navy trucker cap with mesh back"));
    assert_eq!(result.data_source, DataSourceLabel::Both);
}

#[tokio::test]
async fn test_agent_failure_mid_loop_uses_fallback() {
    let llm = ScriptedLlm::new(vec![
        Reply::Tools(vec![("retrieve_product_catalog", "caps")]),
        Reply::Fail("model overloaded"),
    ]);
    let assistant = assistant(&llm, stocked_tools());

    let result = assistant.respond("caps?", "s1", Mode::Agent).await;

    assert_eq!(result.status_code, STATUS_OK);
    assert_eq!(result.response, GENERATION_FALLBACK);

    // Tool scaffolding is committed with a closing answer
    let history = assistant.history("s1").await;
    assert_eq!(history.last(), Some(&Message::assistant(GENERATION_FALLBACK)));
}

#[tokio::test]
async fn test_agent_deadline() {
    let llm = ScriptedLlm::new(vec![Reply::Stall]);
    let config = RagConfig {
        agent_deadline_secs: 1,
        ..RagConfig::default()
    };
    let assistant = assistant_with(&llm, stocked_tools(), config);

    let result = assistant.respond("caps?", "s1", Mode::Agent).await;

    assert_eq!(result.status_code, STATUS_FAILED);
    assert!(result.error.as_deref().unwrap().contains("agent turn exceeded"));
    assert!(assistant.history("s1").await.is_empty());
}
