use based_persist::{PersistError, PersistenceClient, Result};
use std::sync::Arc;

/// Per-user credit balance on top of the store's atomic increment
#[derive(Clone)]
pub struct BalanceLedger {
    persist: Arc<dyn PersistenceClient>,
}

impl BalanceLedger {
    pub fn new(persist: Arc<dyn PersistenceClient>) -> Self {
        Self { persist }
    }

    pub async fn balance(&self, user_id: i64) -> Result<f64> {
        self.persist
            .get_user(user_id)
            .await?
            .map(|u| u.remaining_chat_credits)
            .ok_or(PersistError::UserNotFound(user_id))
    }

    /// Apply `delta` and return the new balance. A zero delta only reads it.
    /// The balance may go negative.
    pub async fn adjust(&self, user_id: i64, delta: f64) -> Result<f64> {
        if delta == 0.0 {
            return self.balance(user_id).await;
        }
        let balance = self.persist.adjust_balance(user_id, delta).await?;
        tracing::debug!(user_id, delta, balance, "Balance adjusted");
        Ok(balance)
    }

    pub async fn debit(&self, user_id: i64, amount: f64) -> Result<f64> {
        self.adjust(user_id, -amount).await
    }

    /// Only a strictly positive balance may start new work
    pub async fn check_admission(&self, user_id: i64) -> Result<bool> {
        Ok(self.balance(user_id).await? > 0.0)
    }
}
