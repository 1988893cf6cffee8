use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::time::Duration;

use crate::backend::CacheBackend;
use crate::error::{CacheError, Result};

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Where to reach Redis; mirrors `REDIS_HOST`, `REDIS_PORT` and `REDIS_PASSWORD`
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl RedisSettings {
    pub const DEFAULT_PORT: u16 = 6379;

    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            password: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    fn connection_info(&self) -> Result<redis::ConnectionInfo> {
        let mut info = (self.host.as_str(), self.port).into_connection_info()?;
        info.redis.password = self.password.clone();
        Ok(info)
    }
}

/// Cache backend on Redis lists (`LPUSH`, `LTRIM`, `EXPIRE`, `LRANGE`).
///
/// The connection manager reconnects on its own after a dropped link.
#[derive(Clone)]
pub struct RedisCacheBackend {
    manager: ConnectionManager,
}

impl RedisCacheBackend {
    pub async fn connect(settings: &RedisSettings) -> Result<Self> {
        let client = redis::Client::open(settings.connection_info()?)?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!(host = %settings.host, port = settings.port, "Connected to Redis");
        Ok(Self { manager })
    }

    /// Connect from a `redis://` URL
    pub async fn connect_url(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// `LTRIM` stop index keeping `max_len` items; `None` means drop the list
fn trim_stop(max_len: usize) -> Option<isize> {
    max_len
        .checked_sub(1)
        .map(|stop| isize::try_from(stop).unwrap_or(isize::MAX))
}

/// `EXPIRE` takes whole seconds; round up so a short TTL still expires later
fn expire_secs(ttl: Duration) -> i64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    i64::try_from(secs.max(1)).unwrap_or(i64::MAX)
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn push_front(&self, key: &str, value: String) -> Result<()> {
        self.conn().lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn trim(&self, key: &str, max_len: usize) -> Result<()> {
        match trim_stop(max_len) {
            Some(stop) => self.conn().ltrim::<_, ()>(key, 0, stop).await?,
            None => self.conn().del::<_, ()>(key).await?,
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.conn().expire::<_, ()>(key, expire_secs(ttl)).await?;
        Ok(())
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.conn().lrange(key, 0, -1).await?)
    }

    async fn len(&self, key: &str) -> Result<usize> {
        Ok(self.conn().llen(key).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.conn().exists(key).await?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.conn().del::<_, ()>(key).await?;
        Ok(())
    }
}
