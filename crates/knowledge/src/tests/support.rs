//! Test doubles: a scripted generation backend and fixed similarity
//! backends.

use crate::backend::SimilarityBackend;
use crate::rag::{Assistant, RagContext};
use crate::tools::{RetrievalTool, ToolSet};
use crate::types::{KnowledgeBaseConfig, StoredDocument};
use groundwork_core::{AppError, AppResult, RagConfig};
use groundwork_llm::{ChatRequest, ChatResponse, LlmClient, LlmUsage, Message, ToolCall};
use groundwork_prompt::PromptDefinition;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted generation reply.
pub enum Reply {
    Answer(&'static str),
    /// Tool calls as `(tool name, query)` pairs
    Tools(Vec<(&'static str, &'static str)>),
    Fail(&'static str),
    /// Never returns within any test timeout
    Stall,
    Panic,
}

/// Generation backend that plays back a script and records every request.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Self::with_delay(replies, Duration::ZERO)
    }

    pub fn with_delay(replies: Vec<Reply>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Most calls ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let call_number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let reply = self.replies.lock().unwrap().pop_front();

        if !self.delay.is_zero() {
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let message = match reply {
            Some(Reply::Answer(text)) => Message::assistant(text),
            Some(Reply::Tools(calls)) => Message::assistant_with_tools(
                "",
                calls
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, query))| {
                        let mut args = serde_json::Map::new();
                        args.insert("query".to_string(), serde_json::json!(query));
                        ToolCall::new(format!("call_{}_{}", call_number, i), name, args)
                    })
                    .collect(),
            ),
            Some(Reply::Fail(detail)) => return Err(AppError::Llm(detail.to_string())),
            Some(Reply::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Message::assistant("too late")
            }
            Some(Reply::Panic) => panic!("scripted backend fault"),
            None => return Err(AppError::Llm("script exhausted".to_string())),
        };

        Ok(ChatResponse {
            message,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

/// Similarity backend returning a fixed document list.
pub struct FixedBackend(pub Vec<StoredDocument>);

#[async_trait::async_trait]
impl SimilarityBackend for FixedBackend {
    async fn similarity_search(
        &self,
        _query: &str,
        k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>> {
        Ok(self
            .0
            .iter()
            .take(k)
            .cloned()
            .map(|doc| (doc, 0.8))
            .collect())
    }

    fn document_count(&self) -> usize {
        self.0.len()
    }
}

pub fn product(id: &str, content: &str) -> StoredDocument {
    let mut metadata = serde_json::Map::new();
    metadata.insert("product_id".to_string(), serde_json::json!(id));
    StoredDocument {
        id: id.to_string(),
        content: content.to_string(),
        source: "catalog.json".to_string(),
        category: "cap".to_string(),
        metadata,
    }
}

pub fn page(id: &str, content: &str) -> StoredDocument {
    StoredDocument {
        id: id.to_string(),
        content: content.to_string(),
        source: "website.csv".to_string(),
        category: "page".to_string(),
        metadata: serde_json::Map::new(),
    }
}

fn tool(base: &str, documents: Option<Vec<StoredDocument>>) -> RetrievalTool {
    let backend = documents.map(|docs| Arc::new(FixedBackend(docs)) as Arc<dyn SimilarityBackend>);
    RetrievalTool::new(
        &KnowledgeBaseConfig::preset(base),
        backend,
        3,
        Duration::from_secs(5),
    )
}

/// Website and catalog tools; `None` makes a tool unavailable.
pub fn tool_set(
    website: Option<Vec<StoredDocument>>,
    catalog: Option<Vec<StoredDocument>>,
) -> ToolSet {
    ToolSet::new(vec![tool("website", website), tool("catalog", catalog)])
}

/// Both tools backed by one document each.
pub fn stocked_tools() -> ToolSet {
    tool_set(
        Some(vec![page("w1", "Free shipping on orders over 48 caps")]),
        Some(vec![
            product("i8505", "Navy trucker cap with mesh back"),
            product("i3057", "Navy snapback with flat visor"),
        ]),
    )
}

pub fn assistant_with(llm: &Arc<ScriptedLlm>, tools: ToolSet, config: RagConfig) -> Assistant {
    let client: Arc<dyn LlmClient> = llm.clone();
    Assistant::new(RagContext::new(
        client,
        "test-model",
        tools,
        PromptDefinition::builtin(),
        config,
    ))
}

pub fn assistant(llm: &Arc<ScriptedLlm>, tools: ToolSet) -> Assistant {
    assistant_with(llm, tools, RagConfig::default())
}

/// Text of the system instruction sent with a request.
pub fn system_text(request: &ChatRequest) -> &str {
    match request.messages.first() {
        Some(Message::System { content }) => content,
        _ => "",
    }
}
