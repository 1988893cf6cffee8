use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

use based_llm::ChatClient;
use based_types::{ExchangeConfig, LLMConfig};

use crate::classifier::{LlmPromptClassifier, PromptClassifier};
use crate::orchestrator::Orchestrator;
use crate::prompts::PromptSet;

/// Builder for constructing an [`Orchestrator`] with optional components
pub struct OrchestratorBuilder {
    client: Option<Arc<dyn ChatClient>>,
    classifier: Option<Arc<dyn PromptClassifier>>,
    prompts: PromptSet,
    llm_config: LLMConfig,
    config: ExchangeConfig,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            classifier: None,
            prompts: PromptSet::default(),
            llm_config: LLMConfig::default(),
            config: ExchangeConfig::default(),
        }
    }

    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Defaults to asking the model itself for an instruction index
    pub fn classifier(mut self, classifier: Arc<dyn PromptClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn llm_config(mut self, llm_config: LLMConfig) -> Self {
        self.llm_config = llm_config;
        self
    }

    pub fn config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let client = self.client.ok_or_else(|| anyhow!("Chat client is required"))?;
        if self.config.max_rounds == 0 {
            bail!("max_rounds must be at least 1");
        }

        let classifier = self.classifier.unwrap_or_else(|| {
            Arc::new(LlmPromptClassifier::new(client.clone(), self.llm_config.clone()))
        });

        Ok(Orchestrator::new(
            client,
            classifier,
            self.prompts,
            self.llm_config,
            self.config,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
