use mongodb::{bson::doc, options::ReturnDocument, Client, Collection};

use crate::dbs::mongo::models::MongoCounter;
use crate::error::{PersistError, Result};

/// Hands out monotonically increasing integer ids per collection
#[derive(Clone)]
pub struct MongoCounterRepository {
    collection: Collection<MongoCounter>,
}

impl MongoCounterRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("counters");
        Self { collection }
    }

    pub async fn next_id(&self, sequence: &str) -> Result<i64> {
        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": sequence }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        counter
            .map(|c| c.seq)
            .ok_or_else(|| PersistError::Internal(format!("counter '{}' was not upserted", sequence)))
    }
}
