//! Prompt texts and the task-name to instruction mapping.

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant specialized in NFTs and Crypto Tokens. \
You have access to MCP tools to get accurate information about NFT collections, individual NFTs, \
and search functionality.";

pub const NFT_SCORING_PROMPT: &str = "You need to score NFT collection based on the given criteria. \
Return the score in the range from 0 to 100.";

pub const NFT_SCRAPPING_PROMPT: &str = "You need to scrape NFT collection based on the given criteria. \
Return the scraped data in formatted text with all the details.";

pub const PROJECT_SCORING_PROMPT: &str = "You need to score project based on the given criteria. \
Return the score in the range from 0 to 100.";

pub const X_SCORING_PROMPT: &str = "You need to score X based on the given criteria. \
Return the score in the range from 0 to 100.";

pub const GENERAL_PROMPT: &str = "General purpose prompt for any question that is related with crypto \
and NFTs. If not answer that you can talk only on crypto and NFTs topics.";

pub const TITLE_PROMPT: &str = "Generate a title for the chat based on the messages in the chat. \
Return only the title up to 3 words and 20 characters and in English, no other text.";

const CLASSIFICATION_TEMPLATE: &str = "Analyze the query and determine the best approach to answer \
the question. Here is the list of all possible prompts:\n{prompts}\nChoose one of them and return \
only its index, starting from 0.";

/// Named task instruction selectable by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPrompt {
    pub name: String,
    pub instruction: String,
}

impl TaskPrompt {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
        }
    }
}

/// System prompt plus the indexed instruction variants.
///
/// Named tasks occupy indices `0..tasks.len()`; the general-purpose
/// instruction is always last.
#[derive(Debug, Clone)]
pub struct PromptSet {
    system_prompt: String,
    tasks: Vec<TaskPrompt>,
    general: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new(
            SYSTEM_PROMPT,
            vec![
                TaskPrompt::new("nft_scoring", NFT_SCORING_PROMPT),
                TaskPrompt::new("nft_scrapping", NFT_SCRAPPING_PROMPT),
                TaskPrompt::new("project_scoring", PROJECT_SCORING_PROMPT),
                TaskPrompt::new("X scoring", X_SCORING_PROMPT),
            ],
            GENERAL_PROMPT,
        )
    }
}

impl PromptSet {
    pub fn new(
        system_prompt: impl Into<String>,
        tasks: Vec<TaskPrompt>,
        general: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tasks,
            general: general.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn general(&self) -> &str {
        &self.general
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn index_of(&self, task_name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == task_name)
    }

    pub fn by_name(&self, task_name: &str) -> Option<&str> {
        self.index_of(task_name)
            .map(|i| self.tasks[i].instruction.as_str())
    }

    /// Instruction at `index`, counting the general instruction as the last one
    pub fn by_index(&self, index: usize) -> Option<&str> {
        match index.cmp(&self.tasks.len()) {
            std::cmp::Ordering::Less => Some(self.tasks[index].instruction.as_str()),
            std::cmp::Ordering::Equal => Some(self.general.as_str()),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Number of selectable instructions, general included
    pub fn instruction_count(&self) -> usize {
        self.tasks.len() + 1
    }

    pub fn classification_prompt(&self) -> String {
        let listed = self
            .tasks
            .iter()
            .map(|t| t.instruction.as_str())
            .chain(std::iter::once(self.general.as_str()))
            .enumerate()
            .map(|(i, text)| format!("{}: {}", i, text))
            .collect::<Vec<_>>()
            .join("\n");
        CLASSIFICATION_TEMPLATE.replace("{prompts}", &listed)
    }
}
