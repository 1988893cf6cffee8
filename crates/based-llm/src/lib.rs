pub mod types;
pub mod traits;
pub mod openai;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, LlmTurn, TokenUsage};
pub use openai::OpenAIClient;
pub use types::{FunctionCall, Message, Tool, ToolCall, ToolChoice};
