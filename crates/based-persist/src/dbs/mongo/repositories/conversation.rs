use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoConversation;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoConversationRepository {
    collection: Collection<MongoConversation>,
}

impl MongoConversationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("conversations");
        Self { collection }
    }

    pub async fn create_conversation(
        &self,
        id: i64,
        user_id: i64,
        title: String,
    ) -> Result<MongoConversation> {
        let conversation = MongoConversation {
            id,
            user_id,
            title,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&conversation).await?;
        Ok(conversation)
    }

    pub async fn get_conversation(&self, conversation_id: i64) -> Result<Option<MongoConversation>> {
        Ok(self.collection.find_one(doc! { "_id": conversation_id }).await?)
    }

    /// Newest first
    pub async fn list_conversations(
        &self,
        user_id: i64,
        limit: i64,
        skip: u64,
    ) -> Result<Vec<MongoConversation>> {
        let conversations = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "_id": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(conversations)
    }

    /// Returns whether a conversation matched
    pub async fn update_title(&self, conversation_id: i64, title: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": conversation_id },
                doc! { "$set": { "title": title } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Returns whether a conversation was deleted
    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": conversation_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
