use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title a conversation carries until the first exchange names it
pub const PLACEHOLDER_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Always stored lowercased
    pub wallet_address: String,
    pub email: Option<String>,
    pub remaining_chat_credits: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_placeholder_title(&self) -> bool {
        self.title == PLACEHOLDER_TITLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Immutable chat record. Ids increase in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub role: MessageRole,
    pub conversation_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
        let role: MessageRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, MessageRole::User);
        assert_eq!(role.as_str(), "user");
    }

    #[test]
    fn test_placeholder_title() {
        let mut conversation = Conversation {
            id: 1,
            user_id: 1,
            title: PLACEHOLDER_TITLE.to_string(),
            created_at: Utc::now(),
        };
        assert!(conversation.has_placeholder_title());
        conversation.title = "Azuki floor".to_string();
        assert!(!conversation.has_placeholder_title());
    }
}
