use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::error::{Result, ToolError};
use crate::provider::{ToolDescriptor, ToolProvider};

const TWEETSCOUT_API_BASE: &str = "https://api.tweetscout.io/v2";
const TOOL_COST: f64 = 0.1;

const GET_SCORE: &str = "tweetscout_get_score";
const GET_INFO: &str = "tweetscout_get_info";
const GET_FOLLOWERS_STATS: &str = "tweetscout_get_followers_stats";
const GET_TOP_FOLLOWERS: &str = "tweetscout_get_top_followers";

/// TweetScout REST API exposed as tools (X/Twitter account scoring)
pub struct TweetScoutProvider {
    http_client: reqwest::Client,
    base_url: String,
}

impl TweetScoutProvider {
    pub fn new(api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| ToolError::Protocol(format!("invalid API key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: TWEETSCOUT_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ToolError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET and wrap the body as `{"status": "ok" | "error", ...}`
    async fn fetch(&self, url: Url, query: &[(&str, &str)]) -> Result<Value> {
        let response = self.http_client.get(url).query(query).send().await?;
        let status = response.status();

        if status.is_success() {
            let data: Value = response.json().await?;
            Ok(json!({"status": "ok", "data": data}))
        } else {
            let message = response.text().await.unwrap_or_default();
            Ok(json!({"status": "error", "code": status.as_u16(), "message": message}))
        }
    }
}

fn string_arg<'a>(tool: &str, arguments: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("'{}' must be a string", key),
        }),
    }
}

fn required_arg<'a>(tool: &str, arguments: &'a Value, key: &str) -> Result<&'a str> {
    string_arg(tool, arguments, key)?.ok_or_else(|| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: format!("'{}' is required", key),
    })
}

fn handle_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "user_handle": {"type": "string", "description": description}
        },
        "required": ["user_handle"],
        "additionalProperties": false
    })
}

#[async_trait]
impl ToolProvider for TweetScoutProvider {
    fn provider_name(&self) -> &str {
        "tweetscout"
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(
                GET_SCORE,
                "Retrieve the TweetScout popularity score for a Twitter user handle. \
                 The score estimates how popular the account is among Influencers, Projects, and VCs. \
                 Higher scores indicate greater influence. A 404 means the user was not found.",
                handle_schema("The Twitter handle (without @) of the account to score."),
            ),
            ToolDescriptor::new(
                GET_INFO,
                "Get basic Twitter account information by user handle: avatar, banner, description, \
                 followers count, follows count, account ID, name, registration date, screen name, \
                 status count, and verification status.",
                handle_schema("The Twitter handle (without @) of the account to look up."),
            ),
            ToolDescriptor::new(
                GET_FOLLOWERS_STATS,
                "Get the number of followers per TweetScout category: influencers, projects and VC \
                 employees. Accounts not yet indexed may take longer to respond.",
                json!({
                    "type": "object",
                    "properties": {
                        "user_handle": {
                            "type": "string",
                            "description": "The Twitter handle (without @). Either user_handle or user_id is required."
                        },
                        "user_id": {
                            "type": "string",
                            "description": "The Twitter user ID. Either user_handle or user_id is required."
                        }
                    },
                    "required": [],
                    "additionalProperties": false
                }),
            ),
            ToolDescriptor::new(
                GET_TOP_FOLLOWERS,
                "Get the top 20 followers of an account by TweetScout score. Set 'from' to 'db' to \
                 read from the database only for a faster response.",
                json!({
                    "type": "object",
                    "properties": {
                        "user_handle": {
                            "type": "string",
                            "description": "The Twitter handle (without @) of the account."
                        },
                        "from": {
                            "type": "string",
                            "description": "Optional. Set to 'db' for database-only data.",
                            "enum": ["db"]
                        }
                    },
                    "required": ["user_handle"],
                    "additionalProperties": false
                }),
            ),
        ])
    }

    async fn execute(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        match tool_name {
            GET_SCORE => {
                let handle = required_arg(tool_name, &arguments, "user_handle")?;
                self.fetch(self.endpoint(&["score", handle])?, &[]).await
            }
            GET_INFO => {
                let handle = required_arg(tool_name, &arguments, "user_handle")?;
                self.fetch(self.endpoint(&["info", handle])?, &[]).await
            }
            GET_FOLLOWERS_STATS => {
                let mut query = Vec::new();
                if let Some(handle) = string_arg(tool_name, &arguments, "user_handle")? {
                    query.push(("user_handle", handle));
                }
                if let Some(id) = string_arg(tool_name, &arguments, "user_id")? {
                    query.push(("user_id", id));
                }
                if query.is_empty() {
                    return Err(ToolError::InvalidArguments {
                        tool: tool_name.to_string(),
                        message: "either user_handle or user_id is required".to_string(),
                    });
                }
                self.fetch(self.endpoint(&["followers-stats"])?, &query).await
            }
            GET_TOP_FOLLOWERS => {
                let handle = required_arg(tool_name, &arguments, "user_handle")?;
                let mut query = Vec::new();
                if let Some(from) = string_arg(tool_name, &arguments, "from")? {
                    query.push(("from", from));
                }
                self.fetch(self.endpoint(&["top-followers", handle])?, &query).await
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn unit_cost(&self, tool_name: &str) -> f64 {
        match tool_name {
            GET_SCORE | GET_INFO | GET_FOLLOWERS_STATS | GET_TOP_FOLLOWERS => TOOL_COST,
            _ => 0.0,
        }
    }
}
