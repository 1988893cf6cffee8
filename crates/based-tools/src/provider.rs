use async_trait::async_trait;
use based_llm::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A callable tool as exposed to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Provider-prefixed, unique across a registry
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    /// Charged once per successful execution
    pub unit_cost: f64,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
            unit_cost: 0.0,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.unit_cost = cost;
        self
    }

    pub fn to_llm_tool(&self) -> Tool {
        Tool::new(
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            self.input_schema.clone(),
        )
    }
}

/// Source of tools. Tool names must start with `"<provider_name>_"`.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Run a tool by its fully-qualified name
    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value>;

    fn unit_cost(&self, tool_name: &str) -> f64;

    /// Whether this provider claims `tool_name`
    fn routes(&self, tool_name: &str) -> bool {
        tool_name
            .strip_prefix(self.provider_name())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}
