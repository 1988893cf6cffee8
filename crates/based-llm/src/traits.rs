use crate::types::{Message, Tool, ToolCall, ToolChoice};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat completion capability: produce the next assistant turn for a
/// message history and an optional tool list.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether any tools are offered with this request
    pub fn offers_tools(&self) -> bool {
        self.options.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Offer tools with `tool_choice = auto`. An empty list offers nothing.
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        if tools.is_empty() {
            self.tools = None;
            self.tool_choice = None;
        } else {
            self.tools = Some(tools);
            self.tool_choice = Some(ToolChoice::Auto);
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Plain text response, mostly useful for test doubles
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: None,
            usage: None,
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Tool-call response, mostly useful for test doubles
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls: Some(calls),
            usage: None,
            finish_reason: Some("tool_calls".to_string()),
        }
    }

    /// Decide once what this round produced
    pub fn into_turn(self) -> LlmTurn {
        match self.tool_calls {
            Some(calls) if !calls.is_empty() => LlmTurn::ToolCallsRequested {
                calls,
                content: self.content.filter(|c| !c.is_empty()),
            },
            _ => LlmTurn::FinalAnswer(self.content.filter(|c| !c.is_empty())),
        }
    }
}

/// Outcome of a single model round
#[derive(Debug, Clone, PartialEq)]
pub enum LlmTurn {
    /// Terminal text (absent when the model sent nothing usable)
    FinalAnswer(Option<String>),
    /// Model wants tools executed before answering
    ToolCallsRequested {
        calls: Vec<ToolCall>,
        content: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
