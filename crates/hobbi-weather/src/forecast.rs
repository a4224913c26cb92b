//! Open-Meteo current conditions client.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::WeatherError;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

/// Current temperature (°F) and WMO code.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CurrentConditions {
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    pub weather_code: i64,
}

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Arc<Client>,
    base_url: String,
}

impl ForecastClient {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the current conditions at the given coordinates.
    #[instrument(skip(self), level = "debug")]
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentConditions, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", "temperature_2m,weather_code".to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast request returned status {}", status);
            return Err(WeatherError::FetchFailed(status.as_u16()));
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::debug!(
            temperature = body.current.temperature,
            code = body.current.weather_code,
            "Fetched current conditions"
        );
        Ok(body.current)
    }
}
