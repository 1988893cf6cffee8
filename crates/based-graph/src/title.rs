use anyhow::{bail, Context, Result};
use std::sync::Arc;

use based_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use based_types::LLMConfig;

use crate::prompts::TITLE_PROMPT;

const MAX_TITLE_CHARS: usize = 20;

/// Short conversation titles generated from the first user message
pub struct TitleGenerator {
    client: Arc<dyn ChatClient>,
    llm_config: LLMConfig,
}

impl TitleGenerator {
    pub fn new(client: Arc<dyn ChatClient>, llm_config: LLMConfig) -> Self {
        Self { client, llm_config }
    }

    pub async fn generate(&self, first_message: &str) -> Result<String> {
        let messages = vec![Message::system(TITLE_PROMPT), Message::user(first_message)];

        let mut options = ChatOptions::new();
        if let Some(temp) = self.llm_config.temperature {
            options = options.temperature(temp);
        }
        let request = ChatRequest::new(self.llm_config.model.clone(), messages).with_options(options);

        let response = self
            .client
            .chat(request)
            .await
            .context("title generation request failed")?;

        let title = clean_title(response.content.as_deref().unwrap_or_default());
        if title.is_empty() {
            bail!("model returned an empty title");
        }
        Ok(title)
    }
}

fn clean_title(raw: &str) -> String {
    let unquoted = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim();
    let capped: String = unquoted.chars().take(MAX_TITLE_CHARS).collect();
    capped.trim_end().to_string()
}
