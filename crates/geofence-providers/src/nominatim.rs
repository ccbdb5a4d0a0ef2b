//! OpenStreetMap Nominatim geocoder.

use std::time::Duration;

use async_trait::async_trait;
use geofence_core::{Coordinate, GeocodingProvider, traits::GeocodeError};
use serde::Deserialize;

/// Public Nominatim search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// User agent sent with every lookup; Nominatim's usage policy requires one.
pub const USER_AGENT: &str = "geo_fence_alert";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Geocoder backed by a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Geocoder for the public endpoint.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Geocoder for a self-hosted instance.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

/// Pick the best match out of a search response body.
fn first_match(body: &str) -> Result<Option<Coordinate>, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let parse = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| GeocodeError::Malformed(format!("{raw:?}: {e}")))
    };
    let location = Coordinate::new(parse(&place.lat)?, parse(&place.lon)?);
    if !location.is_valid() {
        return Err(GeocodeError::Malformed(format!(
            "out of range coordinate {location}"
        )));
    }
    tracing::debug!(place = %place.display_name, %location, "Resolved address");
    Ok(Some(location))
}

#[async_trait]
impl GeocodingProvider for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(GeocodeError::Transport(resp.status().to_string()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        first_match(&body)
    }
}
