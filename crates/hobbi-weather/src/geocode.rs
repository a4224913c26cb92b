//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses BigDataCloud's client endpoint - free, no API key required.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::WeatherError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub principal_subdivision: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl GeocodeResponse {
    /// Build the display name, e.g. "Seattle, Washington".
    ///
    /// Locality and subdivision are joined when both exist and differ;
    /// otherwise the city, then the subdivision alone. Empty strings count
    /// as missing.
    pub fn place_name(&self) -> Option<String> {
        let locality = non_empty(&self.locality);
        let subdivision = non_empty(&self.principal_subdivision);

        let mut parts = Vec::with_capacity(2);
        if let Some(locality) = locality {
            parts.push(locality);
        }
        if let Some(subdivision) = subdivision.filter(|s| Some(*s) != locality) {
            parts.push(subdivision);
        }

        if !parts.is_empty() {
            return Some(parts.join(", "));
        }
        non_empty(&self.city).or(subdivision).map(str::to_string)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Reverse geocoder client.
#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    client: Arc<Client>,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Place name for the given coordinates. `Ok(None)` when the service
    /// knows nothing useful about them.
    #[instrument(skip(self), level = "debug")]
    pub async fn place_name(&self, latitude: f64, longitude: f64) -> Result<Option<String>, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("localityLanguage", "en".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Reverse geocode returned status {}", status);
            return Err(WeatherError::FetchFailed(status.as_u16()));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let name = body.place_name();
        if let Some(name) = &name {
            tracing::info!("Reverse geocoded to: {}", name);
        }
        Ok(name)
    }
}
