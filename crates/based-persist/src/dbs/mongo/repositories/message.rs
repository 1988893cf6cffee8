use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;
use crate::models::MessageRole;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn save_message(
        &self,
        id: i64,
        conversation_id: i64,
        role: MessageRole,
        content: String,
    ) -> Result<MongoMessage> {
        let message = MongoMessage {
            id,
            conversation_id,
            role,
            content,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&message).await?;
        Ok(message)
    }

    /// Most recent messages first; ids follow creation order
    pub async fn get_messages(
        &self,
        conversation_id: i64,
        limit: i64,
        skip: u64,
    ) -> Result<Vec<MongoMessage>> {
        let messages = self
            .collection
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "_id": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    pub async fn delete_for_conversation(&self, conversation_id: i64) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "conversation_id": conversation_id })
            .await?;
        Ok(result.deleted_count)
    }
}
