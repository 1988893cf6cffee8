use based_llm::Tool;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::provider::{ToolDescriptor, ToolProvider};

/// Tools aggregated from several providers, plus the cost accrued by
/// executing them.
///
/// The accrued total lives as long as the registry and is never reset, so
/// each pipeline run builds its own registry from the shared providers.
pub struct ToolRegistry {
    providers: Vec<Arc<dyn ToolProvider>>,
    tools: Vec<ToolDescriptor>,
    usage: Mutex<Usage>,
}

#[derive(Debug, Default)]
struct Usage {
    total_cost: f64,
    executions: usize,
}

impl ToolRegistry {
    /// Registry with no providers and no tools
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
            tools: Vec::new(),
            usage: Mutex::new(Usage::default()),
        }
    }

    /// Query every provider for its tools. A provider that fails to list
    /// contributes nothing but stays registered for routing.
    pub async fn initialize(providers: Vec<Arc<dyn ToolProvider>>) -> Self {
        let mut tools = Vec::new();

        for provider in &providers {
            match provider.list_tools().await {
                Ok(listed) => {
                    tracing::debug!(
                        provider = provider.provider_name(),
                        tool_count = listed.len(),
                        "Provider tools listed"
                    );
                    tools.extend(listed.into_iter().map(|tool| {
                        let cost = provider.unit_cost(&tool.name);
                        tool.with_cost(cost)
                    }));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        error = %e,
                        "Failed to list provider tools"
                    );
                }
            }
        }

        Self {
            providers,
            tools,
            usage: Mutex::new(Usage::default()),
        }
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Tool list in the shape sent to the model
    pub fn llm_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolDescriptor::to_llm_tool).collect()
    }

    /// First provider (registration order) whose prefix matches
    pub fn provider_for(&self, tool_name: &str) -> Option<&Arc<dyn ToolProvider>> {
        self.providers.iter().find(|p| p.routes(tool_name))
    }

    /// Execute a tool and render its result as text. Never fails: routing
    /// misses and provider errors come back as descriptive text.
    pub async fn execute(&self, tool_name: &str, arguments: Value) -> String {
        let Some(provider) = self.provider_for(tool_name) else {
            tracing::warn!(tool = tool_name, "No provider found for tool");
            return format!("No provider found for tool: {}", tool_name);
        };

        match provider.execute(tool_name, arguments).await {
            Ok(result) => {
                let cost = provider.unit_cost(tool_name);
                {
                    let mut usage = self.usage.lock();
                    usage.total_cost += cost;
                    usage.executions += 1;
                }
                tracing::info!(tool = tool_name, cost, "Tool executed");
                render(result)
            }
            Err(e) => {
                tracing::warn!(tool = tool_name, error = %e, "Tool execution failed");
                format!("Error executing {}: {}", tool_name, e)
            }
        }
    }

    pub fn total_cost_accrued(&self) -> f64 {
        self.usage.lock().total_cost
    }

    /// Successful executions so far
    pub fn tool_executions(&self) -> usize {
        self.usage.lock().executions
    }
}

fn render(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
