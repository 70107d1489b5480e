//! Nominatim (OpenStreetMap) geocoder.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{Geocoder, ProviderError, ProviderResult};

const SERVICE: &str = "nominatim";

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

impl Place {
    fn into_point(self) -> ProviderResult<GeoPoint> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| ProviderError::InvalidResponse {
                    service: SERVICE,
                    message: format!("bad coordinate '{}'", raw),
                })
        };

        Ok(GeoPoint {
            lat: parse(&self.lat)?,
            lng: parse(&self.lon)?,
            display_name: self.display_name,
        })
    }
}

/// Nominatim-backed [`Geocoder`].
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    /// `client` should carry a descriptive User-Agent; Nominatim's usage
    /// policy rejects anonymous clients.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, location: &str) -> ProviderResult<Option<GeoPoint>> {
        debug!(location, "Geocoding");

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                service: SERVICE,
                source,
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Geocoder returned no result");
            return Ok(None);
        }

        let places: Vec<Place> = response.json().await.map_err(|source| ProviderError::Http {
            service: SERVICE,
            source,
        })?;

        first_point(places)
    }
}

fn first_point(places: Vec<Place>) -> ProviderResult<Option<GeoPoint>> {
    places.into_iter().next().map(Place::into_point).transpose()
}
