//! MCP tool registry and the CineConcerts query tools.
//!
//! Each tool validates its typed input, calls the providers and renders the
//! result as text for the calling agent. Provider failures become error
//! *results* (`isError: true`), never protocol errors: the RPC call itself
//! succeeded.

mod details;
mod format;
mod list;
mod nearby;
mod search;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use crate::providers::{EventSearch, Geocoder, ProviderError};

pub use details::ShowDetailsTool;
pub use format::{format_details, format_event, format_events};
pub use list::ListUpcomingShowsTool;
pub use nearby::FindNearbyShowsTool;
pub use search::SearchShowsTool;

/// Errors that reject a tool call before it runs.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Text produced by a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Result for a search the provider couldn't answer.
    pub fn provider_unavailable(err: &ProviderError) -> Self {
        Self::error(format!(
            "Could not reach the CineConcerts search service: {}",
            err
        ))
    }

    /// `tools/call` result payload.
    pub fn to_result(&self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.text }]
        });
        if self.is_error {
            result["isError"] = Value::Bool(true);
        }
        result
    }
}

/// Trait for MCP tools
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (used in tools/call)
    fn name(&self) -> &str;

    /// Human-readable title
    fn title(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Behavior hints for the client.
    fn annotations(&self) -> Value {
        json!({
            "title": self.title(),
            "readOnlyHint": true,
            "destructiveHint": false,
            "openWorldHint": true
        })
    }

    /// Execute the tool
    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError>;
}

/// Deserialize tool arguments; missing arguments are treated as `{}`.
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Registry of available MCP tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn McpTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn McpTool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn McpTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// List all tools in MCP format
    pub fn list(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name(),
                    "title": t.title(),
                    "description": t.description(),
                    "inputSchema": t.input_schema(),
                    "annotations": t.annotations()
                })
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Call a tool by name
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tool.call(arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Build the registry holding the four CineConcerts tools.
pub fn event_tools(search: Arc<dyn EventSearch>, geocoder: Arc<dyn Geocoder>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SearchShowsTool::new(Arc::clone(&search))));
    registry.register(Arc::new(FindNearbyShowsTool::new(
        Arc::clone(&search),
        geocoder,
    )));
    registry.register(Arc::new(ListUpcomingShowsTool::new(Arc::clone(&search))));
    registry.register(Arc::new(ShowDetailsTool::new(search)));
    registry
}
