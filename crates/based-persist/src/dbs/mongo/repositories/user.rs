use chrono::Utc;
use mongodb::{bson::doc, options::ReturnDocument, Client, Collection};

use crate::dbs::mongo::models::MongoUser;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("users");
        Self { collection }
    }

    pub async fn create_user(
        &self,
        id: i64,
        wallet_address: String,
        email: Option<String>,
        initial_credits: f64,
    ) -> Result<MongoUser> {
        let user = MongoUser {
            id,
            wallet_address,
            email,
            remaining_chat_credits: initial_credits,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&user).await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<MongoUser>> {
        Ok(self.collection.find_one(doc! { "_id": user_id }).await?)
    }

    pub async fn get_user_by_wallet(&self, wallet_address: &str) -> Result<Option<MongoUser>> {
        Ok(self
            .collection
            .find_one(doc! { "wallet_address": wallet_address })
            .await?)
    }

    /// Single `$inc` so concurrent debits never lose an update
    pub async fn increment_credits(&self, user_id: i64, delta: f64) -> Result<Option<MongoUser>> {
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": user_id },
                doc! { "$inc": { "remaining_chat_credits": delta } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }
}
