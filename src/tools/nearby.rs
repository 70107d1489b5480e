//! `find_nearby_shows`: geocode a location, then search around it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{format_events, parse_arguments, McpTool, ToolError, ToolOutput};
use crate::providers::{EventSearch, Geocoder};

const DEFAULT_RADIUS_KM: f64 = 500.0;

fn default_radius() -> f64 {
    DEFAULT_RADIUS_KM
}

#[derive(Debug, Deserialize)]
struct NearbyArgs {
    location: String,
    #[serde(default = "default_radius")]
    radius_km: f64,
}

pub struct FindNearbyShowsTool {
    search: Arc<dyn EventSearch>,
    geocoder: Arc<dyn Geocoder>,
}

impl FindNearbyShowsTool {
    pub fn new(search: Arc<dyn EventSearch>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { search, geocoder }
    }
}

#[async_trait]
impl McpTool for FindNearbyShowsTool {
    fn name(&self) -> &str {
        "find_nearby_shows"
    }

    fn title(&self) -> &str {
        "Find Nearby Shows"
    }

    fn description(&self) -> &str {
        "Find CineConcerts shows near a location (city name, address, or landmark)"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City name, address, or landmark to search near"
                },
                "radius_km": {
                    "type": "number",
                    "default": DEFAULT_RADIUS_KM,
                    "description": "Search radius in kilometers (default 500)"
                }
            },
            "required": ["location"]
        })
    }

    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let args: NearbyArgs = parse_arguments(arguments)?;
        if !(args.radius_km.is_finite() && args.radius_km > 0.0) {
            return Err(ToolError::InvalidArguments(
                "radius_km must be a positive number".to_string(),
            ));
        }

        let point = match self.geocoder.geocode(&args.location).await {
            Ok(point) => point,
            Err(e) => {
                warn!(location = %args.location, error = %e, "Geocoding failed");
                None
            }
        };

        let Some(point) = point else {
            return Ok(ToolOutput::text(format!(
                "Could not geocode \"{}\". Try a more specific city name or address.",
                args.location
            )));
        };

        let radius_m = (args.radius_km * 1000.0).round() as u64;
        let hits = match self.search.geo_search(point.lat, point.lng, radius_m).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(location = %args.location, error = %e, "Geo search failed");
                return Ok(ToolOutput::provider_unavailable(&e));
            }
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(format!(
                "No CineConcerts shows found within {}km of {}.",
                args.radius_km, point.display_name
            )));
        }

        Ok(ToolOutput::text(format!(
            "Found {} show(s) within {}km of {}:\n\n{}",
            hits.len(),
            args.radius_km,
            point.display_name,
            format_events(&hits)
        )))
    }
}
