pub mod builder;
pub mod classifier;
pub mod node;
pub mod nodes;
pub mod orchestrator;
pub mod prompts;
pub mod router;
pub mod title;
pub mod types;

pub use builder::OrchestratorBuilder;
pub use classifier::{KeywordClassifier, LlmPromptClassifier, PromptClassifier};
pub use node::{Node, NodeType};
pub use orchestrator::{Orchestrator, FAILED_RESPONSE, NO_RESPONSE};
pub use prompts::{PromptSet, TaskPrompt};
pub use router::{NextNode, Router, SimpleRouter};
pub use title::TitleGenerator;
pub use types::{ExchangeOutcome, ExchangeState, ExchangeStatus};

// Re-export config types used to build an orchestrator
pub use based_types::{ExchangeConfig, LLMConfig};
