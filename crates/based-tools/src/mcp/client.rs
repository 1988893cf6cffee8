use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rmcp::model::{CallToolRequestParam, ClientInfo};
use rmcp::service::RunningService;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use crate::error::{Result, ToolError};
use crate::mcp::types::{McpToolDef, ToolCallResult};

type Session = Arc<RunningService<RoleClient, ClientInfo>>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// MCP client over the streamable HTTP transport.
///
/// The session is opened lazily on first use. A request that fails on an
/// open session drops it and is retried once on a fresh one, so an expired
/// or restarted server session recovers without a process restart.
pub struct MCPClient {
    server_name: String,
    endpoint: Url,
    http_client: reqwest::Client,
    request_timeout: Duration,
    session: Mutex<Option<Session>>,
}

impl MCPClient {
    pub fn new_http(
        server_name: impl Into<String>,
        endpoint: &str,
        bearer_token: Option<&str>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ToolError::Protocol(format!("invalid bearer token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            server_name: server_name.into(),
            endpoint: Url::parse(endpoint)?,
            http_client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session: Mutex::new(None),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.server_name
    }

    pub async fn list_tools(&self) -> Result<Vec<McpToolDef>> {
        let tools = self
            .with_session("tools/list", |session| async move {
                session
                    .list_all_tools()
                    .await
                    .map_err(|e| ToolError::Protocol(e.to_string()))
            })
            .await?;

        tools
            .into_iter()
            .map(|tool| -> Result<McpToolDef> {
                Ok(serde_json::from_value(serde_json::to_value(tool)?)?)
            })
            .collect()
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolCallResult> {
        let params: CallToolRequestParam = serde_json::from_value(serde_json::json!({
            "name": name,
            "arguments": arguments,
        }))
        .map_err(|e| ToolError::InvalidArguments {
            tool: name.to_string(),
            message: e.to_string(),
        })?;

        let result = self
            .with_session("tools/call", |session| {
                let params = params.clone();
                async move {
                    session
                        .call_tool(params)
                        .await
                        .map_err(|e| ToolError::Protocol(e.to_string()))
                }
            })
            .await?;

        Ok(serde_json::from_value(serde_json::to_value(result)?)?)
    }

    /// Run `op` on the current session, reconnecting once if it fails
    async fn with_session<T, F, Fut>(&self, method: &str, op: F) -> Result<T>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let session = self.session().await?;
        match self.bounded(op(Arc::clone(&session))).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    server = %self.server_name,
                    method,
                    error = %e,
                    "MCP request failed, reopening session"
                );
                self.discard(&session).await;
                let session = self.session().await?;
                self.bounded(op(session)).await
            }
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| {
                ToolError::Protocol(format!(
                    "request timed out after {}s",
                    self.request_timeout.as_secs()
                ))
            })?
    }

    async fn session(&self) -> Result<Session> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let session = Arc::new(self.bounded(self.connect()).await?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Forget `stale` unless another caller already replaced it
    async fn discard(&self, stale: &Session) {
        let mut slot = self.session.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, stale)) {
            *slot = None;
        }
    }

    async fn connect(&self) -> Result<RunningService<RoleClient, ClientInfo>> {
        let config =
            StreamableHttpClientTransportConfig::with_uri(self.endpoint.as_str().to_string());
        let transport =
            StreamableHttpClientTransport::with_client(self.http_client.clone(), config);

        let mut info = ClientInfo::default();
        info.client_info.name = "based-agent".into();
        info.client_info.version = env!("CARGO_PKG_VERSION").into();

        let session = info
            .serve(transport)
            .await
            .map_err(|e| ToolError::Protocol(format!("initialize failed: {}", e)))?;

        tracing::info!(server = %self.server_name, endpoint = %self.endpoint, "MCP session initialized");
        Ok(session)
    }
}
