use std::collections::HashMap;
use std::sync::Arc;

use std::time::Duration;

use based_tools::{MCPClient, McpToolProvider, ToolProvider, ToolRegistry, TweetScoutProvider};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn tweetscout(server: &MockServer) -> TweetScoutProvider {
    TweetScoutProvider::new("ts-key")
        .unwrap()
        .with_base_url(server.uri())
}

#[tokio::test]
async fn test_tweetscout_score_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/score/vitalikbuterin"))
        .and(header("apikey", "ts-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"score": 987})))
        .mount(&server)
        .await;

    let result = tweetscout(&server)
        .execute("tweetscout_get_score", json!({"user_handle": "vitalikbuterin"}))
        .await
        .unwrap();

    assert_eq!(result, json!({"status": "ok", "data": {"score": 987}}));
}

#[tokio::test]
async fn test_tweetscout_http_error_is_reported_in_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info/nobody"))
        .respond_with(ResponseTemplate::new(404).set_body_string("User not found"))
        .mount(&server)
        .await;

    let result = tweetscout(&server)
        .execute("tweetscout_get_info", json!({"user_handle": "nobody"}))
        .await
        .unwrap();

    assert_eq!(result["status"], "error");
    assert_eq!(result["code"], 404);
    assert_eq!(result["message"], "User not found");
}

#[tokio::test]
async fn test_tweetscout_followers_stats_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/followers-stats"))
        .and(query_param("user_id", "44196397"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"influencers": 10})))
        .mount(&server)
        .await;

    let provider = tweetscout(&server);
    let result = provider
        .execute("tweetscout_get_followers_stats", json!({"user_id": "44196397"}))
        .await
        .unwrap();
    assert_eq!(result["data"]["influencers"], 10);

    let err = provider
        .execute("tweetscout_get_followers_stats", json!({}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("either user_handle or user_id is required"));
}

#[tokio::test]
async fn test_tweetscout_top_followers_from_db() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/top-followers/cz_binance"))
        .and(query_param("from", "db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"screeName": "a"}])))
        .mount(&server)
        .await;

    let result = tweetscout(&server)
        .execute(
            "tweetscout_get_top_followers",
            json!({"user_handle": "cz_binance", "from": "db"}),
        )
        .await
        .unwrap();
    assert_eq!(result["status"], "ok");
}

#[tokio::test]
async fn test_tweetscout_missing_handle() {
    let provider = TweetScoutProvider::new("ts-key").unwrap();
    let err = provider
        .execute("tweetscout_get_score", json!({}))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("'user_handle' is required"));
}

/// JSON-RPC reply carrying the id of the request it answers
struct RpcReply {
    result: Value,
    session: Option<&'static str>,
    event_stream: bool,
}

impl RpcReply {
    fn json(result: Value) -> Self {
        Self {
            result,
            session: None,
            event_stream: false,
        }
    }

    fn with_session(mut self, session: &'static str) -> Self {
        self.session = Some(session);
        self
    }

    fn as_event_stream(mut self) -> Self {
        self.event_stream = true;
        self
    }
}

impl Respond for RpcReply {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = serde_json::from_slice::<Value>(&request.body)
            .map(|body| body["id"].clone())
            .unwrap_or(Value::Null);
        let reply = json!({"jsonrpc": "2.0", "id": id, "result": self.result});

        let mut template = if self.event_stream {
            ResponseTemplate::new(200).set_body_raw(
                format!("event: message\ndata: {}\n\n", reply),
                "text/event-stream",
            )
        } else {
            ResponseTemplate::new(200).set_body_json(reply)
        };
        if let Some(session) = self.session {
            template = template.insert_header("mcp-session-id", session);
        }
        template
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2025-03-26",
        "capabilities": {"tools": {}},
        "serverInfo": {"name": "opensea", "version": "1.0.0"}
    })
}

fn tools_list_result() -> Value {
    json!({"tools": [{
        "name": "get_collection",
        "description": "Collection details",
        "inputSchema": {"type": "object", "properties": {"slug": {"type": "string"}}}
    }]})
}

/// Notifications and the optional standalone event stream
async fn mount_session_plumbing(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "notifications/initialized"})))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(405))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_mcp_server(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(RpcReply::json(initialize_result()).with_session("sess-1"))
        .expect(1)
        .mount(server)
        .await;

    mount_session_plumbing(server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .and(header("mcp-session-id", "sess-1"))
        .respond_with(RpcReply::json(tools_list_result()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mcp_provider_prefixes_and_calls_tools() {
    let server = MockServer::start().await;
    mount_mcp_server(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "tools/call",
            "params": {"name": "get_collection", "arguments": {"slug": "azuki"}}
        })))
        .and(header("authorization", "Bearer token"))
        .respond_with(
            RpcReply::json(json!({"content": [{"type": "text", "text": "floor 5 ETH"}]}))
                .as_event_stream(),
        )
        .mount(&server)
        .await;

    let client = MCPClient::new_http("opensea", &server.uri(), Some("token")).unwrap();
    let provider = McpToolProvider::new(client)
        .with_costs(HashMap::from([("opensea_get_collection".to_string(), 0.02)]));

    let tools = provider.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "opensea_get_collection");
    assert_eq!(tools[0].description.as_deref(), Some("Collection details"));

    let result = provider
        .execute("opensea_get_collection", json!({"slug": "azuki"}))
        .await
        .unwrap();
    assert_eq!(result, json!("floor 5 ETH"));
    assert_eq!(provider.unit_cost("opensea_get_collection"), 0.02);
}

#[tokio::test]
async fn test_mcp_tool_error_becomes_registry_text() {
    let server = MockServer::start().await;
    mount_mcp_server(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(RpcReply::json(json!({
            "content": [{"type": "text", "text": "collection not found"}],
            "isError": true
        })))
        .mount(&server)
        .await;

    let client = MCPClient::new_http("opensea", &server.uri(), None).unwrap();
    let registry = ToolRegistry::initialize(vec![Arc::new(McpToolProvider::new(client))]).await;

    assert_eq!(registry.list_tools().len(), 1);
    let text = registry
        .execute("opensea_get_collection", json!({"slug": "missing"}))
        .await;
    assert_eq!(
        text,
        "Error executing opensea_get_collection: Tool reported failure: collection not found"
    );
    assert_eq!(registry.total_cost_accrued(), 0.0);
}

#[tokio::test]
async fn test_mcp_expired_session_is_reopened() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(RpcReply::json(initialize_result()).with_session("s1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(RpcReply::json(initialize_result()).with_session("s2"))
        .expect(1)
        .mount(&server)
        .await;

    mount_session_plumbing(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .and(header("mcp-session-id", "s1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Session not found"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .and(header("mcp-session-id", "s2"))
        .respond_with(RpcReply::json(tools_list_result()))
        .mount(&server)
        .await;

    let client = MCPClient::new_http("opensea", &server.uri(), None)
        .unwrap()
        .with_request_timeout(Duration::from_secs(5));

    let first = client.list_tools().await.unwrap();
    assert_eq!(first[0].name, "get_collection");

    // The replacement session is kept for later calls
    let second = client.list_tools().await.unwrap();
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn test_unreachable_mcp_server_does_not_block_other_providers() {
    let ts_server = MockServer::start().await;

    let client = MCPClient::new_http("opensea", "http://127.0.0.1:9/mcp", None).unwrap();
    let registry = ToolRegistry::initialize(vec![
        Arc::new(McpToolProvider::new(client)),
        Arc::new(tweetscout(&ts_server)),
    ])
    .await;

    let names: Vec<_> = registry.list_tools().iter().map(|t| t.name.clone()).collect();
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|n| n.starts_with("tweetscout_")));
}
