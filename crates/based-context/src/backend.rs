use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// List-valued key/value store with whole-key expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Insert at the head of the list, creating it if absent
    async fn push_front(&self, key: &str, value: String) -> Result<()>;

    /// Keep only the first `max_len` items
    async fn trim(&self, key: &str, max_len: usize) -> Result<()>;

    /// Expire the whole key `ttl` from now; no-op for a missing key
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// All items, head first
    async fn read_all(&self, key: &str) -> Result<Vec<String>>;

    async fn len(&self, key: &str) -> Result<usize>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;
}
