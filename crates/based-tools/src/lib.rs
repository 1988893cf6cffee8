pub mod error;
pub mod mcp;
pub mod provider;
pub mod providers;
pub mod registry;

pub use error::{Result, ToolError};
pub use mcp::MCPClient;
pub use provider::{ToolDescriptor, ToolProvider};
pub use providers::{McpToolProvider, TweetScoutProvider};
pub use registry::ToolRegistry;
