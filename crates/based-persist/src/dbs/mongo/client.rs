use async_trait::async_trait;
use mongodb::Client;

use crate::dbs::mongo::repositories::{
    MongoConversationRepository, MongoCounterRepository, MongoMessageRepository,
    MongoUserRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{Conversation, Message, MessageRole, User};
use crate::trait_client::PersistenceClient;

const USER_SEQUENCE: &str = "users";
const CONVERSATION_SEQUENCE: &str = "conversations";
const MESSAGE_SEQUENCE: &str = "messages";

pub struct MongoPersistenceClient {
    counters: MongoCounterRepository,
    user_repo: MongoUserRepository,
    conversation_repo: MongoConversationRepository,
    message_repo: MongoMessageRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!(database, "Connected to MongoDB");

        Ok(Self {
            counters: MongoCounterRepository::new(&client, database),
            user_repo: MongoUserRepository::new(&client, database),
            conversation_repo: MongoConversationRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_user(
        &self,
        wallet_address: &str,
        email: Option<String>,
        initial_credits: f64,
    ) -> Result<User> {
        let wallet_address = wallet_address.to_lowercase();
        if self.user_repo.get_user_by_wallet(&wallet_address).await?.is_some() {
            return Err(PersistError::DuplicateWallet(wallet_address));
        }

        let id = self.counters.next_id(USER_SEQUENCE).await?;
        let user = self
            .user_repo
            .create_user(id, wallet_address, email, initial_credits)
            .await?;
        Ok(user.into())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.user_repo.get_user(user_id).await?.map(Into::into))
    }

    async fn get_user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        let user = self
            .user_repo
            .get_user_by_wallet(&wallet_address.to_lowercase())
            .await?;
        Ok(user.map(Into::into))
    }

    async fn adjust_balance(&self, user_id: i64, delta: f64) -> Result<f64> {
        self.user_repo
            .increment_credits(user_id, delta)
            .await?
            .map(|u| u.remaining_chat_credits)
            .ok_or(PersistError::UserNotFound(user_id))
    }

    async fn create_conversation(&self, user_id: i64, title: &str) -> Result<Conversation> {
        let id = self.counters.next_id(CONVERSATION_SEQUENCE).await?;
        let conversation = self
            .conversation_repo
            .create_conversation(id, user_id, title.to_string())
            .await?;
        Ok(conversation.into())
    }

    async fn get_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>> {
        let conversation = self.conversation_repo.get_conversation(conversation_id).await?;
        Ok(conversation.map(Into::into))
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Conversation>> {
        let conversations = self
            .conversation_repo
            .list_conversations(user_id, limit as i64, offset as u64)
            .await?;
        Ok(conversations.into_iter().map(Into::into).collect())
    }

    async fn update_conversation_title(&self, conversation_id: i64, title: &str) -> Result<()> {
        if !self.conversation_repo.update_title(conversation_id, title).await? {
            return Err(PersistError::ConversationNotFound(conversation_id));
        }
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        if !self.conversation_repo.delete_conversation(conversation_id).await? {
            return Err(PersistError::ConversationNotFound(conversation_id));
        }
        let removed = self.message_repo.delete_for_conversation(conversation_id).await?;
        tracing::debug!(conversation_id, removed, "Deleted conversation messages");
        Ok(())
    }

    async fn create_message(
        &self,
        content: &str,
        role: MessageRole,
        conversation_id: i64,
    ) -> Result<Message> {
        let id = self.counters.next_id(MESSAGE_SEQUENCE).await?;
        let message = self
            .message_repo
            .save_message(id, conversation_id, role, content.to_string())
            .await?;
        Ok(message.into())
    }

    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>> {
        let messages = self
            .message_repo
            .get_messages(conversation_id, limit as i64, offset as u64)
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }
}
