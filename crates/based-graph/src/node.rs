use anyhow::Result;
use async_trait::async_trait;
use based_tools::ToolRegistry;

use crate::types::ExchangeState;

/// One step of the exchange loop
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute the node's logic, updating the exchange state
    async fn execute(&self, state: &mut ExchangeState, registry: &ToolRegistry) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    LLM,
    Tool,
}
