use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use based_context::{CachedHistoryEntry, ConversationCache, HistoryAssembler};
use based_graph::{Orchestrator, TitleGenerator};
use based_persist::{
    Conversation, Message, MessageRole, PersistenceClient, User, PLACEHOLDER_TITLE,
};
use based_tools::{ToolProvider, ToolRegistry};

use crate::error::{ApiError, ApiResult};
use crate::ledger::BalanceLedger;
use crate::single_flight::SingleFlightGuard;

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Upper bound on the title request so it cannot hold the pipeline
pub const TITLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Assistant reply plus the balance left after billing it
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedMessage {
    pub message: Message,
    pub remaining_credits: f64,
}

/// Conversation operations and the per-message processing pipeline
pub struct ChatService {
    persist: Arc<dyn PersistenceClient>,
    cache: Arc<ConversationCache>,
    history: HistoryAssembler,
    orchestrator: Arc<Orchestrator>,
    titles: TitleGenerator,
    providers: Vec<Arc<dyn ToolProvider>>,
    guard: Arc<SingleFlightGuard>,
    ledger: BalanceLedger,
}

impl ChatService {
    pub fn new(
        persist: Arc<dyn PersistenceClient>,
        cache: Arc<ConversationCache>,
        orchestrator: Arc<Orchestrator>,
        titles: TitleGenerator,
        providers: Vec<Arc<dyn ToolProvider>>,
    ) -> Self {
        Self {
            history: HistoryAssembler::new(Arc::clone(&cache), Arc::clone(&persist)),
            ledger: BalanceLedger::new(Arc::clone(&persist)),
            guard: Arc::new(SingleFlightGuard::new()),
            persist,
            cache,
            orchestrator,
            titles,
            providers,
        }
    }

    pub fn guard(&self) -> &Arc<SingleFlightGuard> {
        &self.guard
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Handle one inbound user message end to end.
    ///
    /// Admission and ownership are checked before the conversation is
    /// locked, so a rejected call leaves no trace. Everything after the lock
    /// runs on its own task: once the user message is recorded the reply is
    /// stored and billed even if the caller goes away. The lock is released
    /// by the guard's drop when that task ends.
    pub async fn process_user_message(
        self: &Arc<Self>,
        user_id: i64,
        conversation_id: i64,
        content: &str,
        task_name: Option<&str>,
    ) -> ApiResult<ProcessedMessage> {
        self.admit(user_id).await?;
        self.verify_ownership(conversation_id, user_id).await?;

        let pending = self
            .guard
            .acquire(conversation_id)
            .ok_or(ApiError::ConversationBusy(conversation_id))?;

        let service = Arc::clone(self);
        let content = content.to_string();
        let task_name = task_name.map(String::from);
        let run = tokio::spawn(async move {
            let _pending = pending;
            service
                .run_pipeline(user_id, conversation_id, &content, task_name.as_deref())
                .await
        });

        run.await.map_err(|e| {
            tracing::error!(user_id, conversation_id, error = %e, "Message pipeline task failed");
            ApiError::Internal(format!("message pipeline task failed: {}", e))
        })?
    }

    async fn run_pipeline(
        &self,
        user_id: i64,
        conversation_id: i64,
        content: &str,
        task_name: Option<&str>,
    ) -> ApiResult<ProcessedMessage> {
        // Re-read under the lock so the title is replaced at most once
        let conversation = self
            .persist
            .get_conversation(conversation_id)
            .await?
            .ok_or(ApiError::ConversationNotFound(conversation_id))?;

        let start = Instant::now();
        tracing::info!(
            user_id,
            conversation_id,
            task = task_name.unwrap_or("auto"),
            "Processing user message"
        );

        let user_message = self
            .persist
            .create_message(content, MessageRole::User, conversation_id)
            .await?;

        let window = self
            .history
            .assemble(conversation_id, Some(user_message.id))
            .await?;

        self.refresh_title(&conversation, content).await;

        let registry = ToolRegistry::initialize(self.providers.clone()).await;
        let outcome = self
            .orchestrator
            .run_exchange(
                conversation_id,
                window.to_llm_messages(),
                content,
                task_name,
                &registry,
            )
            .await;

        let assistant_message = self
            .persist
            .create_message(&outcome.text, MessageRole::Assistant, conversation_id)
            .await?;

        self.cache
            .append(conversation_id, &CachedHistoryEntry::from(&user_message))
            .await?;
        self.cache
            .append(conversation_id, &CachedHistoryEntry::from(&assistant_message))
            .await?;
        self.cache
            .extend_expiry(conversation_id, self.cache.config().ttl)
            .await?;

        let tool_cost = registry.total_cost_accrued();
        let charge = tool_cost + self.orchestrator.config().base_fee;
        let remaining_credits = self.ledger.debit(user_id, charge).await?;

        tracing::info!(
            user_id,
            conversation_id,
            status = ?outcome.status,
            rounds = outcome.rounds,
            tool_calls = outcome.tool_calls,
            tool_cost,
            charge,
            remaining_credits,
            duration_ms = start.elapsed().as_millis() as u64,
            "User message processed"
        );

        Ok(ProcessedMessage {
            message: assistant_message,
            remaining_credits,
        })
    }

    pub async fn create_conversation(&self, user_id: i64) -> ApiResult<Conversation> {
        self.admit(user_id).await?;
        let conversation = self
            .persist
            .create_conversation(user_id, PLACEHOLDER_TITLE)
            .await?;
        tracing::info!(user_id, conversation_id = conversation.id, "Conversation created");
        Ok(conversation)
    }

    pub async fn list_conversations(
        &self,
        user_id: i64,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> ApiResult<Vec<Conversation>> {
        let (limit, offset) = page(limit, offset)?;
        Ok(self.persist.list_conversations(user_id, limit, offset).await?)
    }

    pub async fn get_conversation(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> ApiResult<Conversation> {
        self.verify_ownership(conversation_id, user_id).await
    }

    pub async fn list_messages(
        &self,
        user_id: i64,
        conversation_id: i64,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> ApiResult<Vec<Message>> {
        let (limit, offset) = page(limit, offset)?;
        self.verify_ownership(conversation_id, user_id).await?;
        Ok(self
            .persist
            .list_messages(conversation_id, limit, offset)
            .await?)
    }

    /// Remove a conversation with its messages and cached history.
    /// Refused while a message is in flight for it.
    pub async fn delete_conversation(&self, user_id: i64, conversation_id: i64) -> ApiResult<()> {
        self.verify_ownership(conversation_id, user_id).await?;
        let _pending = self
            .guard
            .acquire(conversation_id)
            .ok_or(ApiError::ConversationBusy(conversation_id))?;

        self.persist.delete_conversation(conversation_id).await?;
        self.cache.clear(conversation_id).await?;
        tracing::info!(user_id, conversation_id, "Conversation deleted");
        Ok(())
    }

    pub fn task_types(&self) -> Vec<String> {
        self.orchestrator
            .prompts()
            .task_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn is_pending(&self, conversation_id: i64) -> bool {
        self.guard.is_pending(conversation_id)
    }

    pub async fn get_user(&self, user_id: i64) -> ApiResult<User> {
        self.persist
            .get_user(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }

    async fn admit(&self, user_id: i64) -> ApiResult<()> {
        if self.ledger.check_admission(user_id).await? {
            Ok(())
        } else {
            tracing::info!(user_id, "Rejected: no chat credits");
            Err(ApiError::InsufficientCredits)
        }
    }

    async fn verify_ownership(&self, conversation_id: i64, user_id: i64) -> ApiResult<Conversation> {
        let conversation = self
            .persist
            .get_conversation(conversation_id)
            .await?
            .ok_or(ApiError::ConversationNotFound(conversation_id))?;

        if conversation.user_id != user_id {
            tracing::warn!(user_id, conversation_id, "Conversation access denied");
            return Err(ApiError::AccessDenied(conversation_id));
        }
        Ok(conversation)
    }

    /// Best effort: a failed title leaves the placeholder in place
    async fn refresh_title(&self, conversation: &Conversation, first_message: &str) {
        if !conversation.has_placeholder_title() {
            return;
        }

        let generated = tokio::time::timeout(TITLE_TIMEOUT, self.titles.generate(first_message)).await;
        let title = match generated {
            Ok(Ok(title)) => title,
            Ok(Err(e)) => {
                tracing::warn!(conversation_id = conversation.id, error = %e, "Title generation failed");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    conversation_id = conversation.id,
                    timeout_secs = TITLE_TIMEOUT.as_secs(),
                    "Title generation timed out"
                );
                return;
            }
        };

        if let Err(e) = self
            .persist
            .update_conversation_title(conversation.id, &title)
            .await
        {
            tracing::warn!(conversation_id = conversation.id, error = %e, "Failed to store title");
        }
    }
}

fn page(limit: Option<usize>, offset: Option<usize>) -> ApiResult<(usize, usize)> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok((limit, offset.unwrap_or(0)))
}
