pub mod mcp;
pub mod tweetscout;

pub use mcp::McpToolProvider;
pub use tweetscout::TweetScoutProvider;
