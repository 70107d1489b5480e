//! `get_show_details`: full record for one show code.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{format_details, parse_arguments, McpTool, ToolError, ToolOutput};
use crate::providers::EventSearch;

#[derive(Debug, Deserialize)]
struct DetailsArgs {
    show_code: String,
}

pub struct ShowDetailsTool {
    search: Arc<dyn EventSearch>,
}

impl ShowDetailsTool {
    pub fn new(search: Arc<dyn EventSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl McpTool for ShowDetailsTool {
    fn name(&self) -> &str {
        "get_show_details"
    }

    fn title(&self) -> &str {
        "Get Show Details"
    }

    fn description(&self) -> &str {
        "Get full details for a specific CineConcerts show by its show code"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "show_code": {
                    "type": "string",
                    "description": "The show code identifier (e.g. HP4-NYC-2026)"
                }
            },
            "required": ["show_code"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: DetailsArgs = parse_arguments(arguments)?;

        match self.search.find_by_show_code(&args.show_code).await {
            Ok(Some(hit)) => Ok(ToolOutput::text(format_details(&hit, &args.show_code))),
            Ok(None) => Ok(ToolOutput::text(format!(
                "No CineConcerts show found with code \"{}\".",
                args.show_code
            ))),
            Err(e) => {
                warn!(show_code = %args.show_code, error = %e, "Show lookup failed");
                Ok(ToolOutput::provider_unavailable(&e))
            }
        }
    }
}
