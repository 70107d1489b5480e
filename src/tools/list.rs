//! `list_upcoming_shows`: browse the catalog.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{format_events, parse_arguments, McpTool, ToolError, ToolOutput};
use crate::providers::EventSearch;

const DEFAULT_LIMIT: f64 = 20.0;
const MAX_LIMIT: f64 = 60.0;

fn default_limit() -> f64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default = "default_limit")]
    limit: f64,
}

impl ListArgs {
    /// Requested limit clamped to 1..=60.
    fn effective_limit(&self) -> u32 {
        if self.limit.is_finite() {
            self.limit.clamp(1.0, MAX_LIMIT) as u32
        } else {
            DEFAULT_LIMIT as u32
        }
    }
}

pub struct ListUpcomingShowsTool {
    search: Arc<dyn EventSearch>,
}

impl ListUpcomingShowsTool {
    pub fn new(search: Arc<dyn EventSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl McpTool for ListUpcomingShowsTool {
    fn name(&self) -> &str {
        "list_upcoming_shows"
    }

    fn title(&self) -> &str {
        "List Upcoming Shows"
    }

    fn description(&self) -> &str {
        "Browse all upcoming CineConcerts film-concert events"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "number",
                    "default": DEFAULT_LIMIT,
                    "description": "Number of shows to return (default 20, max 60)"
                }
            }
        })
    }

    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: ListArgs = parse_arguments(arguments)?;
        let limit = args.effective_limit();

        let hits = match self.search.browse(limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(limit, error = %e, "Browse failed");
                return Ok(ToolOutput::provider_unavailable(&e));
            }
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text("No upcoming CineConcerts shows found."));
        }

        Ok(ToolOutput::text(format!(
            "Showing {} upcoming CineConcerts event(s):\n\n{}",
            hits.len(),
            format_events(&hits)
        )))
    }
}
