//! External providers: the event search index and the geocoder.
//!
//! Tools only see the [`EventSearch`] and [`Geocoder`] traits, so they can be
//! exercised against in-memory fakes. The production implementations talk to
//! Algolia and Nominatim over HTTPS.

mod algolia;
mod hit;
mod nominatim;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use algolia::{AlgoliaClient, AlgoliaConfig};
pub use hit::{fields, EventHit};
pub use nominatim::{GeoPoint, NominatimGeocoder, DEFAULT_GEOCODER_URL};

/// Errors raised by provider calls.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be sent or the body could not be read.
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    /// The provider answered with something we could not interpret.
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Event catalog queries.
#[async_trait]
pub trait EventSearch: Send + Sync {
    /// Full-text search.
    async fn search(&self, query: &str) -> ProviderResult<Vec<EventHit>>;

    /// Events within `radius_m` metres of a coordinate.
    async fn geo_search(&self, lat: f64, lng: f64, radius_m: u64) -> ProviderResult<Vec<EventHit>>;

    /// Browse the catalog without a query.
    async fn browse(&self, limit: u32) -> ProviderResult<Vec<EventHit>>;

    /// Look up one event by its show code.
    async fn find_by_show_code(&self, show_code: &str) -> ProviderResult<Option<EventHit>>;
}

/// Free-text location resolution.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location: &str) -> ProviderResult<Option<GeoPoint>>;
}

/// Build the HTTP client shared by the providers.
pub fn http_client(timeout: Duration, user_agent: &str) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|source| ProviderError::Http {
            service: "http client",
            source,
        })
}

/// Pick the hit whose show code (or object ID) matches `show_code`.
///
/// Falls back to the best-ranked hit when nothing matches exactly.
pub fn pick_show_code_match(hits: Vec<EventHit>, show_code: &str) -> Option<EventHit> {
    let wanted = show_code.to_lowercase();
    let exact = hits.iter().position(|h| {
        h.show_code().is_some_and(|c| c.to_lowercase() == wanted)
            || h.object_id() == Some(show_code)
    });

    let index = exact.unwrap_or(0);
    hits.into_iter().nth(index)
}
