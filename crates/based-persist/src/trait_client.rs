use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Conversation, Message, MessageRole, User};

/// Trait for database persistence operations
///
/// Implementations provide database-specific CRUD operations. List
/// operations return records newest-first.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a user; the wallet address is stored lowercased
    async fn create_user(
        &self,
        wallet_address: &str,
        email: Option<String>,
        initial_credits: f64,
    ) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn get_user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>>;

    /// Atomically add `delta` to the user's credits and return the new balance
    async fn adjust_balance(&self, user_id: i64, delta: f64) -> Result<f64>;

    async fn create_conversation(&self, user_id: i64, title: &str) -> Result<Conversation>;

    async fn get_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>>;

    async fn list_conversations(
        &self,
        user_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Conversation>>;

    async fn update_conversation_title(&self, conversation_id: i64, title: &str) -> Result<()>;

    /// Delete a conversation together with its messages
    async fn delete_conversation(&self, conversation_id: i64) -> Result<()>;

    async fn create_message(
        &self,
        content: &str,
        role: MessageRole,
        conversation_id: i64,
    ) -> Result<Message>;

    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>>;
}
