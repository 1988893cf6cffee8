use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds for one multi-round exchange and its billing
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeConfig {
    /// Maximum model rounds; the last one is offered no tools
    pub max_rounds: usize,
    /// Wall-clock budget for the whole exchange, classification included
    pub timeout: Duration,
    /// Charged per processed message on top of tool costs
    pub base_fee: f64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_rounds: 6,
            timeout: Duration::from_secs(60),
            base_fee: 0.1,
        }
    }
}

impl ExchangeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_fee(mut self, fee: f64) -> Self {
        self.base_fee = fee;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LLMConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "gpt-5-mini".to_string(),
            temperature: Some(1.0),
            max_tokens: None,
        }
    }
}

/// Recent-history cache bounds
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Quiet period after which a conversation's cached list expires
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 20,
        }
    }
}
