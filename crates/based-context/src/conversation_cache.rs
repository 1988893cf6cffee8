use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use based_persist::{Message, MessageRole};
use based_types::CacheConfig;

use crate::backend::CacheBackend;
use crate::error::Result;

/// JSON projection of a stored message kept in the recent-history cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedHistoryEntry {
    pub id: i64,
    pub content: String,
    pub role: MessageRole,
    pub conversation_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for CachedHistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            content: message.content.clone(),
            role: message.role,
            conversation_id: message.conversation_id,
            created_at: message.created_at,
        }
    }
}

impl CachedHistoryEntry {
    pub fn to_llm_message(&self) -> based_llm::Message {
        match self.role {
            MessageRole::User => based_llm::Message::user(self.content.clone()),
            MessageRole::Assistant => based_llm::Message::assistant(self.content.clone()),
        }
    }
}

/// Bounded, expiring newest-first history per conversation
pub struct ConversationCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl ConversationCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn key(conversation_id: i64) -> String {
        format!("chat_messages:{}", conversation_id)
    }

    /// Newest first; empty means miss. Unreadable entries are skipped.
    pub async fn get_recent_entries(&self, conversation_id: i64) -> Result<Vec<CachedHistoryEntry>> {
        let raw = self.backend.read_all(&Self::key(conversation_id)).await?;
        Ok(raw
            .iter()
            .filter_map(|item| match serde_json::from_str(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(conversation_id, error = %e, "Skipping unreadable cache entry");
                    None
                }
            })
            .collect())
    }

    /// Push to the front, trim to the size bound and restart the quiet period
    pub async fn append(&self, conversation_id: i64, entry: &CachedHistoryEntry) -> Result<()> {
        let key = Self::key(conversation_id);
        self.backend.push_front(&key, serde_json::to_string(entry)?).await?;
        self.backend.trim(&key, self.config.max_entries).await?;
        self.backend.expire(&key, self.config.ttl).await
    }

    pub async fn extend_expiry(&self, conversation_id: i64, ttl: Duration) -> Result<()> {
        self.backend.expire(&Self::key(conversation_id), ttl).await
    }

    pub async fn clear(&self, conversation_id: i64) -> Result<()> {
        self.backend.delete(&Self::key(conversation_id)).await
    }

    pub async fn count_entries(&self, conversation_id: i64) -> Result<usize> {
        self.backend.len(&Self::key(conversation_id)).await
    }

    pub async fn is_cached(&self, conversation_id: i64) -> Result<bool> {
        self.backend.exists(&Self::key(conversation_id)).await
    }
}
