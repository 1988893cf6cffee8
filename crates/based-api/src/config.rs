use based_context::RedisSettings;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub tweetscout_api_key: Option<String>,
    #[serde(default)]
    pub opensea_bearer_token: Option<String>,
    /// Shared conversation cache; in-process when `REDIS_HOST` is unset
    #[serde(skip)]
    pub redis: Option<RedisSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Outer request timeout; sits above the exchange timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl From<LlmConfig> for based_types::LLMConfig {
    fn from(config: LlmConfig) -> Self {
        Self {
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeSettings {
    pub max_rounds: usize,
    pub timeout_secs: u64,
    pub base_fee: f64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        let defaults = based_types::ExchangeConfig::default();
        Self {
            max_rounds: defaults.max_rounds,
            timeout_secs: defaults.timeout.as_secs(),
            base_fee: defaults.base_fee,
        }
    }
}

impl From<ExchangeSettings> for based_types::ExchangeConfig {
    fn from(settings: ExchangeSettings) -> Self {
        Self::new()
            .with_max_rounds(settings.max_rounds)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_base_fee(settings.base_fee)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = based_types::CacheConfig::default();
        Self {
            ttl_secs: defaults.ttl.as_secs(),
            max_entries: defaults.max_entries,
        }
    }
}

impl From<CacheSettings> for based_types::CacheConfig {
    fn from(settings: CacheSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_secs),
            max_entries: settings.max_entries,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    /// Overrides the public TweetScout endpoint
    #[serde(default)]
    pub tweetscout_base_url: Option<String>,
    /// OpenSea MCP server; the provider is skipped when unset
    #[serde(default)]
    pub opensea_mcp_url: Option<String>,
    #[serde(default)]
    pub opensea_tool_costs: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml
    /// 3. Environment variables such as `BASED_SERVER__PORT` or `BASED_EXCHANGE__MAX_ROUNDS`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("BASED")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
            ConfigError::Message("MONGODB_URI environment variable is required".to_string())
        })?;
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        cfg.tweetscout_api_key = non_empty_env("TWEETSCOUT_API_KEY");
        cfg.opensea_bearer_token = non_empty_env("OPENSEA_BEARER_TOKEN");
        cfg.redis = redis_settings(
            non_empty_env("REDIS_HOST"),
            non_empty_env("REDIS_PORT"),
            non_empty_env("REDIS_PASSWORD"),
        )?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn redis_settings(
    host: Option<String>,
    port: Option<String>,
    password: Option<String>,
) -> Result<Option<RedisSettings>, ConfigError> {
    let Some(host) = host else {
        return Ok(None);
    };
    let port = match port {
        Some(port) => port.trim().parse::<u16>().map_err(|_| {
            ConfigError::Message(format!("REDIS_PORT is not a valid port: {}", port))
        })?,
        None => RedisSettings::DEFAULT_PORT,
    };
    Ok(Some(
        RedisSettings::new(host).with_port(port).with_password(password),
    ))
}
