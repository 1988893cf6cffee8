use std::sync::Arc;

use based_persist::PersistenceClient;

use crate::conversation_cache::{CachedHistoryEntry, ConversationCache};
use crate::error::ContextError;

/// History handed to the orchestrator, oldest first
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    pub entries: Vec<CachedHistoryEntry>,
    /// Whether the window came from the cache rather than the durable store
    pub from_cache: bool,
}

impl HistoryWindow {
    pub fn to_llm_messages(&self) -> Vec<based_llm::Message> {
        self.entries.iter().map(CachedHistoryEntry::to_llm_message).collect()
    }
}

/// Reads recent history from the cache, falling back to the durable store
/// and warming the cache on a miss
pub struct HistoryAssembler {
    cache: Arc<ConversationCache>,
    persist_client: Arc<dyn PersistenceClient>,
}

impl HistoryAssembler {
    pub fn new(cache: Arc<ConversationCache>, persist_client: Arc<dyn PersistenceClient>) -> Self {
        Self { cache, persist_client }
    }

    /// `exclude_message_id` is the inbound message already written for this
    /// turn; it is sent separately and must not appear twice.
    pub async fn assemble(
        &self,
        conversation_id: i64,
        exclude_message_id: Option<i64>,
    ) -> Result<HistoryWindow, ContextError> {
        let mut cached = self.cache.get_recent_entries(conversation_id).await?;
        if !cached.is_empty() {
            cached.retain(|e| Some(e.id) != exclude_message_id);
            cached.reverse();
            tracing::debug!(conversation_id, entries = cached.len(), "History served from cache");
            return Ok(HistoryWindow {
                entries: cached,
                from_cache: true,
            });
        }

        let window = self.cache.config().max_entries;
        let fetch = window + usize::from(exclude_message_id.is_some());
        let stored = self
            .persist_client
            .list_messages(conversation_id, fetch, 0)
            .await?;

        let mut entries: Vec<CachedHistoryEntry> = stored
            .iter()
            .filter(|m| Some(m.id) != exclude_message_id)
            .take(window)
            .map(CachedHistoryEntry::from)
            .collect();
        entries.reverse();

        for entry in &entries {
            self.cache.append(conversation_id, entry).await?;
        }

        tracing::debug!(
            conversation_id,
            entries = entries.len(),
            "History loaded from store and cached"
        );

        Ok(HistoryWindow {
            entries,
            from_cache: false,
        })
    }
}
