pub mod client;
pub mod types;

pub use client::MCPClient;
pub use types::{McpToolDef, ToolCallResult, ToolContent};
