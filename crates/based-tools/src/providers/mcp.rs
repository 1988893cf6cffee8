use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Result, ToolError};
use crate::mcp::MCPClient;
use crate::provider::{ToolDescriptor, ToolProvider};

/// Exposes the tools of one MCP server under `"<name>_"`-prefixed names
/// (e.g. the OpenSea server as `opensea_search_collections`).
pub struct McpToolProvider {
    name: String,
    client: MCPClient,
    costs: HashMap<String, f64>,
}

impl McpToolProvider {
    pub fn new(client: MCPClient) -> Self {
        Self {
            name: client.name().to_string(),
            client,
            costs: HashMap::new(),
        }
    }

    /// Per-tool price keyed by prefixed name; unlisted tools are free
    pub fn with_costs(mut self, costs: HashMap<String, f64>) -> Self {
        self.costs = costs;
        self
    }

    fn prefixed(&self, tool: &str) -> String {
        format!("{}_{}", self.name, tool)
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = self.client.list_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| ToolDescriptor {
                name: self.prefixed(&tool.name),
                description: tool.description,
                input_schema: tool.input_schema,
                unit_cost: 0.0,
            })
            .collect())
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        let remote_name = tool_name
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        let result = self.client.call_tool(remote_name, arguments).await?;
        let text = result.joined_text();
        if result.is_error {
            return Err(ToolError::ToolFailed(text));
        }
        Ok(Value::String(text))
    }

    fn unit_cost(&self, tool_name: &str) -> f64 {
        self.costs.get(tool_name).copied().unwrap_or(0.0)
    }
}
