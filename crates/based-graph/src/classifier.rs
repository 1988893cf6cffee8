use async_trait::async_trait;
use std::sync::Arc;

use based_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use based_types::LLMConfig;

use crate::prompts::PromptSet;

/// Picks one of the indexed instructions of a [`PromptSet`] for a message.
///
/// `None` means no confident choice; callers fall back to the general
/// instruction.
#[async_trait]
pub trait PromptClassifier: Send + Sync {
    async fn classify(
        &self,
        prompts: &PromptSet,
        history: &[Message],
        user_message: &str,
    ) -> Option<usize>;
}

/// Asks the model to answer with the instruction index
pub struct LlmPromptClassifier {
    client: Arc<dyn ChatClient>,
    llm_config: LLMConfig,
}

impl LlmPromptClassifier {
    pub fn new(client: Arc<dyn ChatClient>, llm_config: LLMConfig) -> Self {
        Self { client, llm_config }
    }

    fn parse_index(reply: &str, prompts: &PromptSet) -> Option<usize> {
        reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '.' || c == '`')
            .parse::<usize>()
            .ok()
            .filter(|i| *i < prompts.instruction_count())
    }
}

#[async_trait]
impl PromptClassifier for LlmPromptClassifier {
    async fn classify(
        &self,
        prompts: &PromptSet,
        history: &[Message],
        user_message: &str,
    ) -> Option<usize> {
        let mut messages = history.to_vec();
        messages.push(Message::system(prompts.classification_prompt()));
        messages.push(Message::user(user_message));

        let mut options = ChatOptions::new();
        if let Some(temp) = self.llm_config.temperature {
            options = options.temperature(temp);
        }
        let request = ChatRequest::new(self.llm_config.model.clone(), messages).with_options(options);

        match self.client.chat(request).await {
            Ok(response) => {
                let reply = response.content.unwrap_or_default();
                let index = Self::parse_index(&reply, prompts);
                if index.is_none() {
                    tracing::debug!(reply = %reply, "Classifier reply is not a valid prompt index");
                }
                index
            }
            Err(e) => {
                tracing::warn!(error = %e, "Prompt classification failed");
                None
            }
        }
    }
}

struct KeywordRule {
    task: &'static str,
    /// Every group must have at least one keyword present
    groups: &'static [&'static [&'static str]],
}

const SCORE_WORDS: &[&str] = &["score", "scoring", "rate", "rating", "evaluate"];

const BUILTIN_RULES: &[KeywordRule] = &[
    KeywordRule {
        task: "nft_scrapping",
        groups: &[&["scrape", "scrap", "extract", "collect data"]],
    },
    KeywordRule {
        task: "X scoring",
        groups: &[SCORE_WORDS, &["twitter", "tweet", "x account", "@"]],
    },
    KeywordRule {
        task: "nft_scoring",
        groups: &[SCORE_WORDS, &["nft", "collection"]],
    },
    KeywordRule {
        task: "project_scoring",
        groups: &[SCORE_WORDS, &["project", "token", "protocol"]],
    },
];

/// Deterministic classifier matching keywords against the lowercased message
#[derive(Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PromptClassifier for KeywordClassifier {
    async fn classify(
        &self,
        prompts: &PromptSet,
        _history: &[Message],
        user_message: &str,
    ) -> Option<usize> {
        let text = user_message.to_lowercase();
        BUILTIN_RULES
            .iter()
            .find(|rule| {
                rule.groups
                    .iter()
                    .all(|group| group.iter().any(|kw| text.contains(kw)))
            })
            .and_then(|rule| prompts.index_of(rule.task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        let prompts = PromptSet::default();
        assert_eq!(LlmPromptClassifier::parse_index(" 2\n", &prompts), Some(2));
        assert_eq!(LlmPromptClassifier::parse_index("\"4\"", &prompts), Some(4));
        assert_eq!(LlmPromptClassifier::parse_index("5", &prompts), None);
        assert_eq!(LlmPromptClassifier::parse_index("-1", &prompts), None);
        assert_eq!(LlmPromptClassifier::parse_index("two", &prompts), None);
    }

    #[tokio::test]
    async fn test_keyword_rules() {
        let prompts = PromptSet::default();
        let classifier = KeywordClassifier::new();
        let cases = [
            ("Please score the Azuki NFT collection", Some(0)),
            ("Scrape the Pudgy Penguins listings", Some(1)),
            ("Rate the Uniswap project", Some(2)),
            ("score @vitalikbuterin on twitter", Some(3)),
            ("gm, what is ETH?", None),
        ];

        for (message, expected) in cases {
            assert_eq!(
                classifier.classify(&prompts, &[], message).await,
                expected,
                "message: {}",
                message
            );
        }
    }
}
