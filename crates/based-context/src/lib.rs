mod backend;
mod conversation_cache;
mod error;
mod history;
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;

pub use backend::CacheBackend;
pub use conversation_cache::{CachedHistoryEntry, ConversationCache};
pub use error::{CacheError, ContextError, Result};
pub use history::{HistoryAssembler, HistoryWindow};
pub use memory::InMemoryCacheBackend;
#[cfg(feature = "redis")]
pub use redis_backend::{RedisCacheBackend, RedisSettings};
