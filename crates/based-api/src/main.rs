use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use based_api::{build_router, config::Config, AppState, ChatService};
use based_context::{CacheBackend, ConversationCache, InMemoryCacheBackend, RedisCacheBackend};
use based_graph::{Orchestrator, TitleGenerator};
use based_llm::{ChatClient, OpenAIClient};
use based_persist::{MongoPersistenceClient, PersistenceClient};
use based_tools::{MCPClient, McpToolProvider, ToolProvider, TweetScoutProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting BasedAgent API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let llm_client: Arc<dyn ChatClient> = Arc::new(OpenAIClient::new(config.openai_api_key.clone())?);
    let llm_config: based_types::LLMConfig = config.llm.clone().into();

    tracing::info!("Connecting to MongoDB");
    let mongo_client =
        MongoPersistenceClient::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    let persist: Arc<dyn PersistenceClient> = Arc::new(mongo_client);
    tracing::info!("MongoDB connected");

    let cache_backend: Arc<dyn CacheBackend> = match &config.redis {
        Some(settings) => Arc::new(RedisCacheBackend::connect(settings).await?),
        None => {
            tracing::warn!("REDIS_HOST not set, using in-process conversation cache");
            Arc::new(InMemoryCacheBackend::new())
        }
    };
    let cache = Arc::new(ConversationCache::new(cache_backend, config.cache.clone().into()));

    let providers = build_providers(&config)?;

    let orchestrator = Orchestrator::builder()
        .client(Arc::clone(&llm_client))
        .llm_config(llm_config.clone())
        .config(config.exchange.clone().into())
        .build()?;
    let titles = TitleGenerator::new(Arc::clone(&llm_client), llm_config);

    let chat = ChatService::new(
        Arc::clone(&persist),
        cache,
        Arc::new(orchestrator),
        titles,
        providers,
    );

    let state = Arc::new(AppState::new(config.clone(), persist, chat));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Providers are registered only when their credentials or endpoint are set
fn build_providers(config: &Config) -> anyhow::Result<Vec<Arc<dyn ToolProvider>>> {
    let mut providers: Vec<Arc<dyn ToolProvider>> = Vec::new();

    if let Some(url) = &config.tools.opensea_mcp_url {
        let client = MCPClient::new_http("opensea", url, config.opensea_bearer_token.as_deref())?;
        providers.push(Arc::new(
            McpToolProvider::new(client).with_costs(config.tools.opensea_tool_costs.clone()),
        ));
        tracing::info!(url = %url, "OpenSea MCP provider registered");
    }

    match &config.tweetscout_api_key {
        Some(key) => {
            let mut provider = TweetScoutProvider::new(key)?;
            if let Some(base_url) = &config.tools.tweetscout_base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            providers.push(Arc::new(provider));
            tracing::info!("TweetScout provider registered");
        }
        None => tracing::warn!("TWEETSCOUT_API_KEY not set, TweetScout tools disabled"),
    }

    Ok(providers)
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
