//! Nominatim (OpenStreetMap) geocoder.
//!
//! Uses the `/search` endpoint with `format=jsonv2` and takes the first
//! match. Nominatim returns latitude and longitude as strings.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use super::{build_client, check_status};
use crate::geo::Coordinate;
use crate::services::{Geocoder, ProviderError};

/// A single search hit. Only the fields we use.
#[derive(Deserialize, Debug)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

fn parse_place(place: &Place) -> Result<Coordinate, ProviderError> {
    let lat = place
        .lat
        .parse::<f64>()
        .map_err(|e| ProviderError::Parse(format!("latitude '{}': {e}", place.lat)))?;
    let lon = place
        .lon
        .parse::<f64>()
        .map_err(|e| ProviderError::Parse(format!("longitude '{}': {e}", place.lon)))?;
    Coordinate::new(lat, lon).map_err(|e| ProviderError::Parse(e.to_string()))
}

pub struct NominatimGeocoder {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    /// Creates a geocoder against `base_url` (no trailing `/search`).
    ///
    /// Nominatim's usage policy requires an identifying `user_agent`.
    pub fn new(
        base_url: String,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(user_agent, timeout)?,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(ProviderError::NotFound(address.to_string()));
        }
        debug!("Nominatim search: '{}'", query);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let response = check_status("Nominatim", response).await?;

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let place = places
            .first()
            .ok_or_else(|| ProviderError::NotFound(query.to_string()))?;
        let coordinate = parse_place(place)?;
        info!(
            "Geocoded '{}' -> {} ({})",
            query,
            coordinate,
            place.display_name.as_deref().unwrap_or("unnamed")
        );
        Ok(coordinate)
    }
}
