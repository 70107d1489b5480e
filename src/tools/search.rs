//! `search_shows`: keyword search over the event catalog.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{format_events, parse_arguments, McpTool, ToolError, ToolOutput};
use crate::providers::EventSearch;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

pub struct SearchShowsTool {
    search: Arc<dyn EventSearch>,
}

impl SearchShowsTool {
    pub fn new(search: Arc<dyn EventSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl McpTool for SearchShowsTool {
    fn name(&self) -> &str {
        "search_shows"
    }

    fn title(&self) -> &str {
        "Search Shows"
    }

    fn description(&self) -> &str {
        "Search for upcoming CineConcerts film-concert events by keyword (film title, city, venue, etc.)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search keyword: film title, city, venue name, or any text"
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: SearchArgs = parse_arguments(arguments)?;

        let hits = match self.search.search(&args.query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %args.query, error = %e, "Search failed");
                return Ok(ToolOutput::provider_unavailable(&e));
            }
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No CineConcerts shows found matching \"{}\".",
                args.query
            )));
        }

        Ok(ToolOutput::text(format!(
            "Found {} show(s) matching \"{}\":\n\n{}",
            hits.len(),
            args.query,
            format_events(&hits)
        )))
    }
}
