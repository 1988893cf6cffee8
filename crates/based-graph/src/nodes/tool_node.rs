use anyhow::Result;
use async_trait::async_trait;
use std::time::Instant;

use based_tools::ToolRegistry;

use crate::node::Node;
use crate::types::ExchangeState;

/// Runs the pending tool calls sequentially. Failures become tool-result
/// text for the model; they never abort the exchange.
pub struct ToolNode;

#[async_trait]
impl Node for ToolNode {
    async fn execute(&self, state: &mut ExchangeState, registry: &ToolRegistry) -> Result<()> {
        for tool_call in state.take_pending_tool_calls() {
            let start = Instant::now();
            let name = tool_call.name().to_string();

            let content = match tool_call.arguments_value() {
                Ok(args) => {
                    let result = registry.execute(&name, args).await;
                    format!("Tool: {} Result: {}", name, result)
                }
                Err(e) => format!("Tool execution failed: {}", e),
            };

            tracing::debug!(
                conversation_id = state.conversation_id,
                tool = %name,
                duration_ms = start.elapsed().as_millis() as u64,
                "Tool call finished"
            );

            state.add_tool_result(tool_call.id, content);
        }

        Ok(())
    }
}
