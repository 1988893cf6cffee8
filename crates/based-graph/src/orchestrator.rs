use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

use based_llm::{ChatClient, Message};
use based_tools::ToolRegistry;
use based_types::{ExchangeConfig, LLMConfig};

use crate::builder::OrchestratorBuilder;
use crate::classifier::PromptClassifier;
use crate::node::{Node, NodeType};
use crate::nodes::{LLMNode, ToolNode};
use crate::prompts::PromptSet;
use crate::router::{NextNode, Router, SimpleRouter};
use crate::types::{ExchangeOutcome, ExchangeState, ExchangeStatus};

/// Text used when the model ends without usable content
pub const NO_RESPONSE: &str = "No response generated";
/// Text used when the exchange times out or a model call fails
pub const FAILED_RESPONSE: &str = "Failed to generate response";

/// Drives one bounded, tool-augmented exchange with the model
pub struct Orchestrator {
    client: Arc<dyn ChatClient>,
    classifier: Arc<dyn PromptClassifier>,
    prompts: PromptSet,
    llm_config: LLMConfig,
    config: ExchangeConfig,
}

impl Orchestrator {
    pub(crate) fn new(
        client: Arc<dyn ChatClient>,
        classifier: Arc<dyn PromptClassifier>,
        prompts: PromptSet,
        llm_config: LLMConfig,
        config: ExchangeConfig,
    ) -> Self {
        Self {
            client,
            classifier,
            prompts,
            llm_config,
            config,
        }
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn llm_config(&self) -> &LLMConfig {
        &self.llm_config
    }

    /// Run the exchange under the configured deadline.
    ///
    /// `history` is oldest-first. A `prompt_selector` naming a known task
    /// skips classification. Never fails: timeouts and model errors are
    /// reported through [`ExchangeStatus`] with fallback text.
    pub async fn run_exchange(
        &self,
        conversation_id: i64,
        history: Vec<Message>,
        user_message: &str,
        prompt_selector: Option<&str>,
        registry: &ToolRegistry,
    ) -> ExchangeOutcome {
        let start = Instant::now();
        let mut state = ExchangeState::new(conversation_id);

        let run = self.drive(&mut state, history, user_message, prompt_selector, registry);
        let result = tokio::time::timeout(self.config.timeout, run).await;
        let status = match result {
            Ok(Ok(())) => ExchangeStatus::Completed,
            Ok(Err(e)) => {
                tracing::error!(conversation_id, run_id = %state.run_id, error = ?e, "Exchange failed");
                ExchangeStatus::ModelFailed
            }
            Err(_) => {
                tracing::warn!(
                    conversation_id,
                    run_id = %state.run_id,
                    timeout_secs = self.config.timeout.as_secs_f64(),
                    "Exchange timed out"
                );
                ExchangeStatus::TimedOut
            }
        };

        let text = match status {
            ExchangeStatus::Completed => state
                .final_text
                .take()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| NO_RESPONSE.to_string()),
            ExchangeStatus::TimedOut | ExchangeStatus::ModelFailed => FAILED_RESPONSE.to_string(),
        };

        tracing::info!(
            conversation_id,
            run_id = %state.run_id,
            rounds = state.round,
            tool_calls = state.tool_calls_executed,
            status = ?status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Exchange finished"
        );

        ExchangeOutcome {
            text,
            rounds: state.round,
            tool_calls: state.tool_calls_executed,
            status,
        }
    }

    async fn drive(
        &self,
        state: &mut ExchangeState,
        history: Vec<Message>,
        user_message: &str,
        prompt_selector: Option<&str>,
        registry: &ToolRegistry,
    ) -> Result<()> {
        let instruction = self
            .resolve_instruction(&history, user_message, prompt_selector)
            .await;

        state.add_message(Message::system(self.prompts.system_prompt()));
        for message in history {
            state.add_message(message);
        }
        state.add_message(Message::user(user_message));
        state.add_message(Message::system(instruction));

        let llm_node = LLMNode::new(
            self.client.clone(),
            self.llm_config.clone(),
            self.config.max_rounds,
        );
        let tool_node = ToolNode;
        let router = SimpleRouter;

        let mut current_node = NodeType::LLM;
        loop {
            match current_node {
                NodeType::LLM => llm_node.execute(state, registry).await?,
                NodeType::Tool => tool_node.execute(state, registry).await?,
            }

            current_node = match router.next(state, current_node) {
                NextNode::LLM => NodeType::LLM,
                NextNode::Tool => NodeType::Tool,
                NextNode::End => break,
            };
        }

        Ok(())
    }

    async fn resolve_instruction(
        &self,
        history: &[Message],
        user_message: &str,
        prompt_selector: Option<&str>,
    ) -> String {
        if let Some(instruction) = prompt_selector.and_then(|name| self.prompts.by_name(name)) {
            return instruction.to_string();
        }
        if let Some(name) = prompt_selector {
            tracing::debug!(task = name, "Unknown task name, classifying instead");
        }

        let index = self
            .classifier
            .classify(&self.prompts, history, user_message)
            .await;

        match index.and_then(|i| self.prompts.by_index(i)) {
            Some(instruction) => instruction.to_string(),
            None => self.prompts.general().to_string(),
        }
    }
}
