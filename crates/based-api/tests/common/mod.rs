#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use based_api::{config::Config, AppState, ChatService};
use based_context::{CacheBackend, CacheError, ConversationCache, InMemoryCacheBackend};
use based_graph::prompts::TITLE_PROMPT;
use based_graph::{ExchangeConfig, KeywordClassifier, Orchestrator, TitleGenerator};
use based_llm::{ChatClient, ChatRequest, ChatResponse, ToolCall};
use based_persist::{
    Conversation, InMemoryPersistenceClient, Message, MessageRole, PersistenceClient, User,
    PLACEHOLDER_TITLE,
};
use based_tools::{ToolDescriptor, ToolError, ToolProvider};
use based_types::{CacheConfig, LLMConfig};

pub enum Step {
    Respond(ChatResponse),
    Fail(&'static str),
    Stall(Duration),
}

/// Answers title requests with a fixed reply and replays a script for
/// everything else
pub struct ScriptedChatClient {
    title: Option<String>,
    title_delay: Mutex<Option<Duration>>,
    script: Mutex<VecDeque<Step>>,
    title_requests: Mutex<usize>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    pub fn new(title: Option<&str>, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            title: title.map(String::from),
            title_delay: Mutex::new(None),
            script: Mutex::new(steps.into()),
            title_requests: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Make every title request wait `delay` before answering
    pub fn stall_titles(&self, delay: Duration) {
        *self.title_delay.lock() = Some(delay);
    }

    pub fn push(&self, step: Step) {
        self.script.lock().push_back(step);
    }

    /// Requests made by exchanges, title requests excluded
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn title_requests(&self) -> usize {
        *self.title_requests.lock()
    }
}

fn is_title_request(request: &ChatRequest) -> bool {
    request.messages.first().and_then(|m| m.text()) == Some(TITLE_PROMPT)
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if is_title_request(&request) {
            *self.title_requests.lock() += 1;
            let delay = *self.title_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            return self
                .title
                .clone()
                .map(ChatResponse::text)
                .ok_or_else(|| anyhow!("title model unavailable"));
        }

        self.requests.lock().push(request);
        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(anyhow!(message)),
            Some(Step::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(ChatResponse::text("too late"))
            }
            None => Err(anyhow!("script exhausted")),
        }
    }
}

/// `providerA_lookup` costs 0.05 per successful call
pub struct LookupProvider;

#[async_trait]
impl ToolProvider for LookupProvider {
    fn provider_name(&self) -> &str {
        "providerA"
    }

    async fn list_tools(&self) -> based_tools::Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new("providerA_lookup", "Look something up", json!({"type": "object"})),
            ToolDescriptor::new("providerA_broken", "Always fails", json!({"type": "object"})),
        ])
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> based_tools::Result<Value> {
        match tool_name {
            "providerA_lookup" => Ok(json!({"found": arguments["q"]})),
            _ => Err(ToolError::ToolFailed("upstream down".to_string())),
        }
    }

    fn unit_cost(&self, tool_name: &str) -> f64 {
        if tool_name == "providerA_lookup" {
            0.05
        } else {
            0.0
        }
    }
}

pub fn lookup_call(id: &str) -> ToolCall {
    ToolCall::new(id, "providerA_lookup", r#"{"q": "azuki"}"#)
}

/// Cache whose writes always fail
pub struct BrokenCacheBackend;

#[async_trait]
impl CacheBackend for BrokenCacheBackend {
    async fn push_front(&self, _key: &str, _value: String) -> based_context::Result<()> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn trim(&self, _key: &str, _max_len: usize) -> based_context::Result<()> {
        Ok(())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> based_context::Result<()> {
        Ok(())
    }

    async fn read_all(&self, _key: &str) -> based_context::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn len(&self, _key: &str) -> based_context::Result<usize> {
        Ok(0)
    }

    async fn exists(&self, _key: &str) -> based_context::Result<bool> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> based_context::Result<()> {
        Ok(())
    }
}

/// In-memory store whose next conversation read returns its snapshot only
/// after a delay, standing in for a slow database round trip
pub struct SlowReadPersistence {
    inner: Arc<InMemoryPersistenceClient>,
    next_read_delay: Mutex<Option<Duration>>,
}

impl SlowReadPersistence {
    pub fn new(inner: Arc<InMemoryPersistenceClient>) -> Self {
        Self {
            inner,
            next_read_delay: Mutex::new(None),
        }
    }

    pub fn delay_next_conversation_read(&self, delay: Duration) {
        *self.next_read_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl PersistenceClient for SlowReadPersistence {
    async fn create_user(
        &self,
        wallet_address: &str,
        email: Option<String>,
        initial_credits: f64,
    ) -> based_persist::Result<User> {
        self.inner.create_user(wallet_address, email, initial_credits).await
    }

    async fn get_user(&self, user_id: i64) -> based_persist::Result<Option<User>> {
        self.inner.get_user(user_id).await
    }

    async fn get_user_by_wallet(&self, wallet_address: &str) -> based_persist::Result<Option<User>> {
        self.inner.get_user_by_wallet(wallet_address).await
    }

    async fn adjust_balance(&self, user_id: i64, delta: f64) -> based_persist::Result<f64> {
        self.inner.adjust_balance(user_id, delta).await
    }

    async fn create_conversation(&self, user_id: i64, title: &str) -> based_persist::Result<Conversation> {
        self.inner.create_conversation(user_id, title).await
    }

    async fn get_conversation(&self, conversation_id: i64) -> based_persist::Result<Option<Conversation>> {
        let snapshot = self.inner.get_conversation(conversation_id).await;
        let delay = self.next_read_delay.lock().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        limit: usize,
        offset: usize,
    ) -> based_persist::Result<Vec<Conversation>> {
        self.inner.list_conversations(user_id, limit, offset).await
    }

    async fn update_conversation_title(&self, conversation_id: i64, title: &str) -> based_persist::Result<()> {
        self.inner.update_conversation_title(conversation_id, title).await
    }

    async fn delete_conversation(&self, conversation_id: i64) -> based_persist::Result<()> {
        self.inner.delete_conversation(conversation_id).await
    }

    async fn create_message(
        &self,
        content: &str,
        role: MessageRole,
        conversation_id: i64,
    ) -> based_persist::Result<Message> {
        self.inner.create_message(content, role, conversation_id).await
    }

    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: usize,
        offset: usize,
    ) -> based_persist::Result<Vec<Message>> {
        self.inner.list_messages(conversation_id, limit, offset).await
    }
}

pub struct Harness {
    pub persist: Arc<InMemoryPersistenceClient>,
    /// The store as the service sees it
    pub store: Arc<SlowReadPersistence>,
    pub cache: Arc<ConversationCache>,
    pub client: Arc<ScriptedChatClient>,
    pub service: Arc<ChatService>,
}

impl Harness {
    pub fn new(client: Arc<ScriptedChatClient>) -> Self {
        Self::with_backend(client, Arc::new(InMemoryCacheBackend::new()))
    }

    pub fn with_backend(client: Arc<ScriptedChatClient>, backend: Arc<dyn CacheBackend>) -> Self {
        let persist = Arc::new(InMemoryPersistenceClient::new());
        let store = Arc::new(SlowReadPersistence::new(persist.clone()));
        let cache = Arc::new(ConversationCache::new(backend, CacheConfig::default()));

        let orchestrator = Orchestrator::builder()
            .client(client.clone())
            .classifier(Arc::new(KeywordClassifier::new()))
            .config(ExchangeConfig::default())
            .build()
            .unwrap();
        let titles = TitleGenerator::new(client.clone(), LLMConfig::default());

        let service = ChatService::new(
            store.clone(),
            cache.clone(),
            Arc::new(orchestrator),
            titles,
            vec![Arc::new(LookupProvider)],
        );

        Self {
            persist,
            store,
            cache,
            client,
            service: Arc::new(service),
        }
    }

    /// A user with `credits` and one fresh conversation
    pub async fn seed(&self, wallet: &str, credits: f64) -> (User, Conversation) {
        let user = self.persist.create_user(wallet, None, credits).await.unwrap();
        let conversation = self
            .persist
            .create_conversation(user.id, PLACEHOLDER_TITLE)
            .await
            .unwrap();
        (user, conversation)
    }

    pub async fn balance(&self, user_id: i64) -> f64 {
        self.persist
            .get_user(user_id)
            .await
            .unwrap()
            .unwrap()
            .remaining_chat_credits
    }

    pub fn app_state(&self) -> Arc<AppState> {
        let config = Config::from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../config/default.toml"
        ))
        .unwrap();
        Arc::new(AppState {
            config: Arc::new(config),
            persist: self.persist.clone(),
            chat: self.service.clone(),
        })
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
