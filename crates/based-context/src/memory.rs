use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

use crate::backend::CacheBackend;
use crate::error::Result;

struct CachedList {
    items: VecDeque<String>,
    expires_at: Option<Instant>,
}

impl CachedList {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local cache backend with lazy expiry on access.
///
/// Time comes from `tokio::time`, so a paused test clock drives expiry.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    lists: Mutex<HashMap<String, CachedList>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the live list for `key`, dropping it first if expired
    fn with_live<T>(&self, key: &str, f: impl FnOnce(Option<&mut CachedList>) -> T) -> T {
        let mut lists = self.lists.lock();
        let now = Instant::now();
        if lists.get(key).is_some_and(|list| list.is_expired(now)) {
            lists.remove(key);
        }
        f(lists.get_mut(key))
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn push_front(&self, key: &str, value: String) -> Result<()> {
        let mut lists = self.lists.lock();
        let now = Instant::now();
        let list = lists.entry(key.to_string()).or_insert_with(|| CachedList {
            items: VecDeque::new(),
            expires_at: None,
        });
        if list.is_expired(now) {
            list.items.clear();
            list.expires_at = None;
        }
        list.items.push_front(value);
        Ok(())
    }

    async fn trim(&self, key: &str, max_len: usize) -> Result<()> {
        self.with_live(key, |list| {
            if let Some(list) = list {
                list.items.truncate(max_len);
            }
        });
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.with_live(key, |list| {
            if let Some(list) = list {
                list.expires_at = Some(Instant::now() + ttl);
            }
        });
        Ok(())
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.with_live(key, |list| {
            list.map(|l| l.items.iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        }))
    }

    async fn len(&self, key: &str) -> Result<usize> {
        Ok(self.with_live(key, |list| list.map_or(0, |l| l.items.len())))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.with_live(key, |list| list.is_some_and(|l| !l.items.is_empty())))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lists.lock().remove(key);
        Ok(())
    }
}
