use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hobbi_core::DatabaseError;
use serde::{Deserialize, Serialize};

/// Weather condition buckets mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Overcast,
    Rain,
    Showers,
    Snow,
    Hazy,
}

impl Condition {
    /// Map a WMO weather code to a condition.
    /// See: https://open-meteo.com/en/docs#weathervariables
    ///
    /// Ranges are checked in order and the first match wins, so the snow
    /// grains codes (71..=77) land in `Rain`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Clear,
            c if c <= 3 => Self::PartlyCloudy,
            c if c <= 48 => Self::Overcast,
            c if c <= 77 => Self::Rain,
            c if c <= 82 => Self::Showers,
            c if c <= 86 => Self::Snow,
            _ => Self::Hazy,
        }
    }

    /// Display glyph shown next to the temperature
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::PartlyCloudy => "⛅",
            Self::Overcast => "☁️",
            Self::Rain => "🌧️",
            Self::Showers => "🌦️",
            Self::Snow => "❄️",
            Self::Hazy => "🌤️",
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Overcast => "Overcast",
            Self::Rain => "Rain",
            Self::Showers => "Showers",
            Self::Snow => "Snow",
            Self::Hazy => "Hazy",
        }
    }
}

/// One weather observation as shown on the dashboard.
///
/// Either every field comes from the same source (a fetch or a cache
/// entry) or every field is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Whole degrees Fahrenheit
    pub temp: Option<i32>,
    /// Condition derived from the forecast's weather code
    pub condition: Option<Condition>,
    /// Place name from reverse geocoding, when it resolved
    pub location: Option<String>,
    /// When the reading was fetched, stored as epoch milliseconds
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WeatherReading {
    /// The explicit "nothing to show" reading.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Build a reading from raw forecast values.
    pub fn observed(
        temperature: f64,
        weather_code: i64,
        location: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            // halves round up
            temp: Some((temperature + 0.5).floor() as i32),
            condition: Some(Condition::from_code(weather_code)),
            location,
            timestamp: Some(timestamp),
        }
    }

    pub fn is_available(&self) -> bool {
        self.temp.is_some()
    }
}

impl fmt::Display for WeatherReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.temp, self.condition) {
            (Some(temp), Some(condition)) => write!(f, "{} {}°", condition.glyph(), temp)?,
            (Some(temp), None) => write!(f, "{}°", temp)?,
            _ => write!(f, "Weather unavailable")?,
        }
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// Where a weather snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherState {
    /// Refresh still in progress; no reading yet.
    Fetching,
    /// Cache entry young enough to skip the network.
    CacheFresh,
    /// Location could not be determined; the stale entry was used.
    CacheStaleFallback,
    /// The platform has no geolocation at all.
    GeoUnavailable,
    /// A new reading was fetched and cached.
    FetchSucceeded,
    /// The fetch was aborted or rejected; stale or empty reading used.
    FetchFailed,
    /// Location could not be determined and nothing was cached.
    Unavailable,
}

/// What consumers of the weather channel see.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub state: WeatherState,
    pub reading: Option<WeatherReading>,
}

impl WeatherSnapshot {
    pub fn fetching() -> Self {
        Self {
            state: WeatherState::Fetching,
            reading: None,
        }
    }

    pub fn settled(state: WeatherState, reading: WeatherReading) -> Self {
        Self {
            state,
            reading: Some(reading),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state != WeatherState::Fetching
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Weather request aborted after {0:?}")]
    FetchAborted(Duration),
    #[error("Weather service returned status {0}")]
    FetchFailed(u16),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Malformed weather cache: {0}")]
    MalformedCache(String),
    #[error("Cache error: {0}")]
    Cache(#[from] DatabaseError),
}
