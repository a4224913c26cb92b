//! Weather service for Hobbi
//!
//! Provides current conditions via the Open-Meteo API, a place name via
//! reverse geocoding, and a cached fallback whenever either is out of reach.

pub mod cache;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use cache::{CacheLookup, WeatherCache, WEATHER_KEY};
pub use forecast::{CurrentConditions, ForecastClient};
pub use geocode::{GeocodeResponse, ReverseGeocoder};
pub use location::{
    ConfiguredGeolocator, FixedGeolocator, Geolocator, NoGeolocator, Position, PositionOptions,
    RememberingGeolocator,
};
pub use provider::WeatherProvider;
pub use types::*;
