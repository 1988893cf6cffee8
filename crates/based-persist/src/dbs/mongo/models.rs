use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Message, MessageRole, User};

/// MongoDB user document; `_id` is a sequence value, not an ObjectId
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: i64,
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub remaining_chat_credits: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: i64,
    pub conversation_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Named sequence in the `counters` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounter {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address,
            email: user.email,
            remaining_chat_credits: user.remaining_chat_credits,
            created_at: user.created_at,
        }
    }
}

impl From<MongoConversation> for Conversation {
    fn from(conversation: MongoConversation) -> Self {
        Self {
            id: conversation.id,
            user_id: conversation.user_id,
            title: conversation.title,
            created_at: conversation.created_at,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id,
            content: msg.content,
            role: msg.role,
            conversation_id: msg.conversation_id,
            created_at: msg.created_at,
        }
    }
}
