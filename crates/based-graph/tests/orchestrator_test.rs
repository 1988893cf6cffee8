use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use based_graph::prompts::{GENERAL_PROMPT, NFT_SCORING_PROMPT, SYSTEM_PROMPT, X_SCORING_PROMPT};
use based_graph::{
    ExchangeConfig, ExchangeStatus, KeywordClassifier, Orchestrator, FAILED_RESPONSE, NO_RESPONSE,
};
use based_llm::{ChatClient, ChatRequest, ChatResponse, Message, ToolCall};
use based_tools::{ToolDescriptor, ToolError, ToolProvider, ToolRegistry};

enum Step {
    Respond(ChatResponse),
    Fail(&'static str),
    Stall(Duration),
}

/// Replays a fixed script of model responses and records every request
struct ScriptedChatClient {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(request);
        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(anyhow!(message)),
            Some(Step::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(ChatResponse::text("too late"))
            }
            None => Err(anyhow!("script exhausted")),
        }
    }
}

struct LookupProvider;

#[async_trait]
impl ToolProvider for LookupProvider {
    fn provider_name(&self) -> &str {
        "providerA"
    }

    async fn list_tools(&self) -> based_tools::Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new("providerA_lookup", "Look something up", json!({"type": "object"})),
            ToolDescriptor::new("providerA_broken", "Always fails", json!({"type": "object"})),
        ])
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> based_tools::Result<Value> {
        match tool_name {
            "providerA_lookup" => Ok(json!({"found": arguments["q"]})),
            _ => Err(ToolError::ToolFailed("upstream down".to_string())),
        }
    }

    fn unit_cost(&self, tool_name: &str) -> f64 {
        if tool_name == "providerA_lookup" {
            0.05
        } else {
            0.0
        }
    }
}

async fn registry() -> ToolRegistry {
    ToolRegistry::initialize(vec![Arc::new(LookupProvider)]).await
}

fn orchestrator(client: Arc<ScriptedChatClient>, config: ExchangeConfig) -> Orchestrator {
    Orchestrator::builder()
        .client(client)
        .config(config)
        .build()
        .unwrap()
}

fn lookup_call(id: &str) -> ToolCall {
    ToolCall::new(id, "providerA_lookup", r#"{"q": "azuki"}"#)
}

#[tokio::test]
async fn test_direct_answer_ends_after_one_round() {
    let client = ScriptedChatClient::new(vec![Step::Respond(ChatResponse::text("Floor is 5 ETH"))]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());
    let registry = registry().await;

    let outcome = orchestrator
        .run_exchange(1, vec![], "Score Azuki", Some("nft_scoring"), &registry)
        .await;

    assert_eq!(outcome.status, ExchangeStatus::Completed);
    assert_eq!(outcome.text, "Floor is 5 ETH");
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.tool_calls, 0);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].offers_tools());
    assert_eq!(
        requests[0].messages,
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user("Score Azuki"),
            Message::system(NFT_SCORING_PROMPT),
        ]
    );
}

#[tokio::test]
async fn test_history_sits_between_system_prompt_and_user_message() {
    let client = ScriptedChatClient::new(vec![Step::Respond(ChatResponse::text("ok"))]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());
    let history = vec![Message::user("first"), Message::assistant("second")];

    orchestrator
        .run_exchange(1, history, "third", Some("X scoring"), &ToolRegistry::empty())
        .await;

    let requests = client.requests();
    let messages = &requests[0].messages;
    assert_eq!(messages[1], Message::user("first"));
    assert_eq!(messages[2], Message::assistant("second"));
    assert_eq!(messages[3], Message::user("third"));
    assert_eq!(messages[4], Message::system(X_SCORING_PROMPT));
    assert!(!requests[0].offers_tools());
}

#[tokio::test]
async fn test_tool_round_then_answer() {
    let client = ScriptedChatClient::new(vec![
        Step::Respond(ChatResponse::tool_calls(vec![lookup_call("call_1")])),
        Step::Respond(ChatResponse::text("Azuki looks healthy")),
    ]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());
    let registry = registry().await;

    let outcome = orchestrator
        .run_exchange(1, vec![], "Score Azuki", Some("nft_scoring"), &registry)
        .await;

    assert_eq!(outcome.text, "Azuki looks healthy");
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.tool_calls, 1);
    assert!((registry.total_cost_accrued() - 0.05).abs() < 1e-9);

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    let second = &requests[1].messages;
    assert_eq!(
        second[3],
        Message::assistant_with_tools(None, vec![lookup_call("call_1")])
    );
    assert_eq!(
        second[4],
        Message::tool_result(
            "call_1",
            r#"Tool: providerA_lookup Result: {"found":"azuki"}"#
        )
    );
}

#[tokio::test]
async fn test_depth_limit_and_last_round_offers_no_tools() {
    let steps = (1..=3)
        .map(|i| Step::Respond(ChatResponse::tool_calls(vec![lookup_call(&format!("call_{}", i))])))
        .collect();
    let client = ScriptedChatClient::new(steps);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default().with_max_rounds(3));
    let registry = registry().await;

    let outcome = orchestrator
        .run_exchange(1, vec![], "loop forever", Some("nft_scoring"), &registry)
        .await;

    assert_eq!(outcome.status, ExchangeStatus::Completed);
    assert_eq!(outcome.rounds, 3);
    assert_eq!(outcome.tool_calls, 2);
    assert_eq!(outcome.text, NO_RESPONSE);

    let offered: Vec<bool> = client.requests().iter().map(|r| r.offers_tools()).collect();
    assert_eq!(offered, vec![true, true, false]);
}

#[tokio::test]
async fn test_default_depth_is_six() {
    let steps = (1..=10)
        .map(|i| Step::Respond(ChatResponse::tool_calls(vec![lookup_call(&format!("call_{}", i))])))
        .collect();
    let client = ScriptedChatClient::new(steps);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());

    let outcome = orchestrator
        .run_exchange(1, vec![], "go", Some("nft_scoring"), &registry().await)
        .await;

    assert_eq!(outcome.rounds, 6);
    assert_eq!(client.requests().len(), 6);
    assert!(!client.requests()[5].offers_tools());
}

#[tokio::test]
async fn test_tool_failures_become_results() {
    let client = ScriptedChatClient::new(vec![
        Step::Respond(ChatResponse::tool_calls(vec![
            ToolCall::new("c1", "providerA_broken", "{}"),
            ToolCall::new("c2", "nobody_home", "{}"),
            ToolCall::new("c3", "providerA_lookup", "{not json"),
        ])),
        Step::Respond(ChatResponse::text("Sorry, tools are flaky")),
    ]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());
    let registry = registry().await;

    let outcome = orchestrator
        .run_exchange(1, vec![], "hi", Some("nft_scoring"), &registry)
        .await;

    assert_eq!(outcome.status, ExchangeStatus::Completed);
    assert_eq!(outcome.tool_calls, 3);
    assert_eq!(registry.total_cost_accrued(), 0.0);

    let requests = client.requests();
    let results: Vec<&str> = requests[1]
        .messages
        .iter()
        .filter(|m| m.role() == "tool")
        .filter_map(|m| m.text())
        .collect();
    assert_eq!(
        results[0],
        "Tool: providerA_broken Result: Error executing providerA_broken: Tool reported failure: upstream down"
    );
    assert_eq!(
        results[1],
        "Tool: nobody_home Result: No provider found for tool: nobody_home"
    );
    assert!(results[2].starts_with("Tool execution failed: "));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_yields_fallback_text() {
    let client = ScriptedChatClient::new(vec![Step::Stall(Duration::from_secs(120))]);
    let orchestrator = orchestrator(client, ExchangeConfig::default());

    let outcome = orchestrator
        .run_exchange(1, vec![], "slow", Some("nft_scoring"), &registry().await)
        .await;

    assert_eq!(outcome.status, ExchangeStatus::TimedOut);
    assert_eq!(outcome.text, FAILED_RESPONSE);
    assert_eq!(outcome.rounds, 1);
}

#[tokio::test]
async fn test_model_error_yields_fallback_text() {
    let client = ScriptedChatClient::new(vec![Step::Fail("connection reset")]);
    let orchestrator = orchestrator(client, ExchangeConfig::default());

    let outcome = orchestrator
        .run_exchange(1, vec![], "hi", Some("nft_scoring"), &ToolRegistry::empty())
        .await;

    assert_eq!(outcome.status, ExchangeStatus::ModelFailed);
    assert_eq!(outcome.text, FAILED_RESPONSE);
    assert!(outcome.is_degraded());
}

#[tokio::test]
async fn test_empty_answer_yields_no_response() {
    let client = ScriptedChatClient::new(vec![Step::Respond(ChatResponse::text("   "))]);
    let orchestrator = orchestrator(client, ExchangeConfig::default());

    let outcome = orchestrator
        .run_exchange(1, vec![], "hi", Some("nft_scoring"), &ToolRegistry::empty())
        .await;

    assert_eq!(outcome.status, ExchangeStatus::Completed);
    assert_eq!(outcome.text, NO_RESPONSE);
}

#[tokio::test]
async fn test_unparseable_classification_uses_general_prompt() {
    let client = ScriptedChatClient::new(vec![
        Step::Respond(ChatResponse::text("I think the second one")),
        Step::Respond(ChatResponse::text("gm")),
    ]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());

    let outcome = orchestrator
        .run_exchange(1, vec![], "gm", None, &ToolRegistry::empty())
        .await;

    assert_eq!(outcome.rounds, 1);
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages[0]
        .text()
        .is_some_and(|t| t.starts_with("Analyze the query")));
    assert_eq!(requests[1].messages.last(), Some(&Message::system(GENERAL_PROMPT)));
}

#[tokio::test]
async fn test_classification_selects_indexed_prompt() {
    let client = ScriptedChatClient::new(vec![
        Step::Respond(ChatResponse::text("3")),
        Step::Respond(ChatResponse::text("Score: 71")),
    ]);
    let orchestrator = orchestrator(client.clone(), ExchangeConfig::default());

    orchestrator
        .run_exchange(1, vec![], "how good is @cz_binance", None, &ToolRegistry::empty())
        .await;

    let requests = client.requests();
    assert_eq!(requests[1].messages.last(), Some(&Message::system(X_SCORING_PROMPT)));
}

#[tokio::test]
async fn test_unknown_task_falls_through_to_classifier() {
    let client = ScriptedChatClient::new(vec![Step::Respond(ChatResponse::text("ok"))]);
    let orchestrator = Orchestrator::builder()
        .client(client.clone())
        .classifier(Arc::new(KeywordClassifier::new()))
        .build()
        .unwrap();

    orchestrator
        .run_exchange(1, vec![], "score the Azuki NFT collection", Some("bogus"), &ToolRegistry::empty())
        .await;

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.last(), Some(&Message::system(NFT_SCORING_PROMPT)));
}

#[test]
fn test_builder_validation() {
    let client = ScriptedChatClient::new(vec![]);
    assert!(Orchestrator::builder().build().is_err());
    assert!(Orchestrator::builder()
        .client(client)
        .config(ExchangeConfig::default().with_max_rounds(0))
        .build()
        .is_err());
}
