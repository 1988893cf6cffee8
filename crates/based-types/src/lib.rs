pub mod config;

pub use config::{CacheConfig, ExchangeConfig, LLMConfig};
