use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::{PersistError, Result};
use crate::models::{Conversation, Message, MessageRole, User};
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    conversations: BTreeMap<i64, Conversation>,
    messages: BTreeMap<i64, Message>,
    last_user_id: i64,
    last_conversation_id: i64,
    last_message_id: i64,
}

/// Process-local store for tests and single-node development runs
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    state: RwLock<MemoryState>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(items: impl Iterator<Item = T>, limit: usize, offset: usize) -> Vec<T> {
    items.skip(offset).take(limit).collect()
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_user(
        &self,
        wallet_address: &str,
        email: Option<String>,
        initial_credits: f64,
    ) -> Result<User> {
        let wallet_address = wallet_address.to_lowercase();
        let mut state = self.state.write();

        if state.users.values().any(|u| u.wallet_address == wallet_address) {
            return Err(PersistError::DuplicateWallet(wallet_address));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            wallet_address,
            email,
            remaining_chat_credits: initial_credits,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.state.read().users.get(&user_id).cloned())
    }

    async fn get_user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        let wallet_address = wallet_address.to_lowercase();
        Ok(self
            .state
            .read()
            .users
            .values()
            .find(|u| u.wallet_address == wallet_address)
            .cloned())
    }

    async fn adjust_balance(&self, user_id: i64, delta: f64) -> Result<f64> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(PersistError::UserNotFound(user_id))?;
        user.remaining_chat_credits += delta;
        Ok(user.remaining_chat_credits)
    }

    async fn create_conversation(&self, user_id: i64, title: &str) -> Result<Conversation> {
        let mut state = self.state.write();
        if !state.users.contains_key(&user_id) {
            return Err(PersistError::UserNotFound(user_id));
        }

        state.last_conversation_id += 1;
        let conversation = Conversation {
            id: state.last_conversation_id,
            user_id,
            title: title.to_string(),
            created_at: Utc::now(),
        };
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, conversation_id: i64) -> Result<Option<Conversation>> {
        Ok(self.state.read().conversations.get(&conversation_id).cloned())
    }

    async fn list_conversations(
        &self,
        user_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Conversation>> {
        let state = self.state.read();
        let owned = state
            .conversations
            .values()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned();
        Ok(page(owned, limit, offset))
    }

    async fn update_conversation_title(&self, conversation_id: i64, title: &str) -> Result<()> {
        let mut state = self.state.write();
        let conversation = state
            .conversations
            .get_mut(&conversation_id)
            .ok_or(PersistError::ConversationNotFound(conversation_id))?;
        conversation.title = title.to_string();
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        let mut state = self.state.write();
        if state.conversations.remove(&conversation_id).is_none() {
            return Err(PersistError::ConversationNotFound(conversation_id));
        }
        state.messages.retain(|_, m| m.conversation_id != conversation_id);
        Ok(())
    }

    async fn create_message(
        &self,
        content: &str,
        role: MessageRole,
        conversation_id: i64,
    ) -> Result<Message> {
        let mut state = self.state.write();
        if !state.conversations.contains_key(&conversation_id) {
            return Err(PersistError::ConversationNotFound(conversation_id));
        }

        state.last_message_id += 1;
        let message = Message {
            id: state.last_message_id,
            content: content.to_string(),
            role,
            conversation_id,
            created_at: Utc::now(),
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn list_messages(
        &self,
        conversation_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>> {
        let state = self.state.read();
        let messages = state
            .messages
            .values()
            .rev()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned();
        Ok(page(messages, limit, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryPersistenceClient, User, Conversation) {
        let client = InMemoryPersistenceClient::new();
        let user = client
            .create_user("0xABCdef", Some("a@b.io".to_string()), 5.0)
            .await
            .unwrap();
        let conversation = client.create_conversation(user.id, "New Chat").await.unwrap();
        (client, user, conversation)
    }

    #[tokio::test]
    async fn test_wallet_is_lowercased_and_unique() {
        let (client, user, _) = seeded().await;
        assert_eq!(user.wallet_address, "0xabcdef");

        let found = client.get_user_by_wallet("0xABCDEF").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let err = client.create_user("0xabcDEF", None, 1.0).await.unwrap_err();
        assert!(matches!(err, PersistError::DuplicateWallet(_)));
    }

    #[tokio::test]
    async fn test_adjust_balance_returns_new_value() {
        let (client, user, _) = seeded().await;

        assert_eq!(client.adjust_balance(user.id, -0.25).await.unwrap(), 4.75);
        assert_eq!(client.adjust_balance(user.id, -10.0).await.unwrap(), -5.25);

        let err = client.adjust_balance(999, 1.0).await.unwrap_err();
        assert!(matches!(err, PersistError::UserNotFound(999)));
    }

    #[tokio::test]
    async fn test_messages_newest_first_with_paging() {
        let (client, _, conversation) = seeded().await;
        for i in 1..=5 {
            client
                .create_message(&format!("m{}", i), MessageRole::User, conversation.id)
                .await
                .unwrap();
        }

        let recent = client.list_messages(conversation.id, 2, 0).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m5", "m4"]);

        let next = client.list_messages(conversation.id, 2, 2).await.unwrap();
        assert_eq!(next[0].content, "m3");
        assert!(next[0].id < recent[1].id);
    }

    #[tokio::test]
    async fn test_conversations_scoped_to_user() {
        let (client, user, first) = seeded().await;
        let other = client.create_user("0x999", None, 1.0).await.unwrap();
        client.create_conversation(other.id, "New Chat").await.unwrap();
        let second = client.create_conversation(user.id, "New Chat").await.unwrap();

        let listed = client.list_conversations(user.id, 50, 0).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let (client, _, conversation) = seeded().await;
        client
            .create_message("hello", MessageRole::User, conversation.id)
            .await
            .unwrap();

        client.delete_conversation(conversation.id).await.unwrap();

        assert!(client.get_conversation(conversation.id).await.unwrap().is_none());
        assert!(client.list_messages(conversation.id, 50, 0).await.unwrap().is_empty());
        assert!(matches!(
            client.delete_conversation(conversation.id).await,
            Err(PersistError::ConversationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_title() {
        let (client, _, conversation) = seeded().await;
        client
            .update_conversation_title(conversation.id, "Azuki floor")
            .await
            .unwrap();
        let updated = client.get_conversation(conversation.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Azuki floor");

        assert!(client.update_conversation_title(42, "x").await.is_err());
    }
}
