//! Algolia search index client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{pick_show_code_match, EventHit, EventSearch, ProviderError, ProviderResult};

const SERVICE: &str = "algolia";

/// Hits returned by keyword and geo searches.
const SEARCH_HITS: u32 = 20;
/// Candidates considered for a show-code lookup.
const SHOW_CODE_CANDIDATES: u32 = 5;

/// Connection settings for the Algolia index.
#[derive(Debug, Clone)]
pub struct AlgoliaConfig {
    pub app_id: String,
    pub api_key: String,
    pub index: String,
    /// Override for the API host (defaults to `https://{app_id}-dsn.algolia.net`).
    pub host: Option<String>,
}

/// Search parameters sent as the query body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams<'a> {
    query: &'a str,
    hits_per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    around_lat_lng: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    around_radius: Option<u64>,
}

impl<'a> SearchParams<'a> {
    fn text(query: &'a str, hits_per_page: u32) -> Self {
        Self {
            query,
            hits_per_page,
            around_lat_lng: None,
            around_radius: None,
        }
    }

    fn around(lat: f64, lng: f64, radius_m: u64) -> Self {
        Self {
            query: "",
            hits_per_page: SEARCH_HITS,
            around_lat_lng: Some(format!("{},{}", lat, lng)),
            around_radius: Some(radius_m.max(1)),
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    hits: Vec<EventHit>,
}

/// Algolia-backed [`EventSearch`].
pub struct AlgoliaClient {
    client: Client,
    url: String,
    app_id: String,
    api_key: String,
}

impl AlgoliaClient {
    pub fn new(client: Client, config: &AlgoliaConfig) -> Self {
        let host = config
            .host
            .clone()
            .unwrap_or_else(|| format!("https://{}-dsn.algolia.net", config.app_id));

        Self {
            client,
            url: format!(
                "{}/1/indexes/{}/query",
                host.trim_end_matches('/'),
                config.index
            ),
            app_id: config.app_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Query endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn query(&self, params: &SearchParams<'_>) -> ProviderResult<Vec<EventHit>> {
        debug!(query = params.query, hits = params.hits_per_page, "Algolia query");

        let response = self
            .client
            .post(&self.url)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(params)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                service: SERVICE,
                source,
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let body: QueryResponse = response.json().await.map_err(|source| ProviderError::Http {
            service: SERVICE,
            source,
        })?;

        Ok(body.hits)
    }
}

#[async_trait]
impl EventSearch for AlgoliaClient {
    async fn search(&self, query: &str) -> ProviderResult<Vec<EventHit>> {
        self.query(&SearchParams::text(query, SEARCH_HITS)).await
    }

    async fn geo_search(&self, lat: f64, lng: f64, radius_m: u64) -> ProviderResult<Vec<EventHit>> {
        self.query(&SearchParams::around(lat, lng, radius_m)).await
    }

    async fn browse(&self, limit: u32) -> ProviderResult<Vec<EventHit>> {
        self.query(&SearchParams::text("", limit)).await
    }

    async fn find_by_show_code(&self, show_code: &str) -> ProviderResult<Option<EventHit>> {
        let hits = self
            .query(&SearchParams::text(show_code, SHOW_CODE_CANDIDATES))
            .await?;
        Ok(pick_show_code_match(hits, show_code))
    }
}
