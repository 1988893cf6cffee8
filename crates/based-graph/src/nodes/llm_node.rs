use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use based_llm::{ChatClient, ChatOptions, ChatRequest, LlmTurn};
use based_tools::ToolRegistry;
use based_types::LLMConfig;

use crate::node::Node;
use crate::types::ExchangeState;

/// One model round. Tools are offered on every round but the last, so the
/// last round always ends the exchange.
pub struct LLMNode {
    client: Arc<dyn ChatClient>,
    llm_config: LLMConfig,
    max_rounds: usize,
}

impl LLMNode {
    pub fn new(client: Arc<dyn ChatClient>, llm_config: LLMConfig, max_rounds: usize) -> Self {
        Self {
            client,
            llm_config,
            max_rounds,
        }
    }

    fn build_request(&self, state: &ExchangeState, registry: &ToolRegistry) -> ChatRequest {
        let mut options = ChatOptions::new();
        if state.round < self.max_rounds {
            options = options.tools(registry.llm_tools());
        }
        if let Some(temp) = self.llm_config.temperature {
            options = options.temperature(temp);
        }
        if let Some(max_tokens) = self.llm_config.max_tokens {
            options = options.max_tokens(max_tokens);
        }

        ChatRequest::new(self.llm_config.model.clone(), state.messages.clone()).with_options(options)
    }
}

#[async_trait]
impl Node for LLMNode {
    async fn execute(&self, state: &mut ExchangeState, registry: &ToolRegistry) -> Result<()> {
        state.round += 1;
        let request = self.build_request(state, registry);

        tracing::debug!(
            conversation_id = state.conversation_id,
            run_id = %state.run_id,
            round = state.round,
            tools_offered = request.offers_tools(),
            "Requesting model round"
        );

        let response = self
            .client
            .chat(request)
            .await
            .with_context(|| format!("model call failed on round {}", state.round))?;

        match response.into_turn() {
            LlmTurn::FinalAnswer(text) => state.finish(text),
            LlmTurn::ToolCallsRequested { calls, content } if state.round >= self.max_rounds => {
                tracing::warn!(
                    conversation_id = state.conversation_id,
                    requested = calls.len(),
                    "Model requested tools on the final round; ignoring"
                );
                state.finish(content);
            }
            LlmTurn::ToolCallsRequested { calls, content } => {
                tracing::info!(
                    conversation_id = state.conversation_id,
                    round = state.round,
                    tools = ?calls.iter().map(|c| c.name()).collect::<Vec<_>>(),
                    "Model requested tool calls"
                );
                state.request_tools(content, calls);
            }
        }

        Ok(())
    }
}
