//! The weather pipeline: cache, then position, then forecast.
//!
//! Each stage has its own bound and every failure falls back to the last
//! cached reading, or to the all-null reading when nothing was cached.
//! Results are published on a watch channel; the channel starts in
//! `Fetching` and settles exactly once per refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hobbi_core::{race_deadline, LocalCache, RaceOutcome, WeatherConfig};
use reqwest::Client;
use tokio::sync::watch;

use crate::cache::{reading_of, CacheLookup, WeatherCache};
use crate::forecast::ForecastClient;
use crate::geocode::ReverseGeocoder;
use crate::location::{Geolocator, Position, PositionOptions};
use crate::types::{LocationError, WeatherError, WeatherReading, WeatherSnapshot, WeatherState};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("Hobbi/", env!("CARGO_PKG_VERSION"));

/// Weather acquisition for the dashboard header.
pub struct WeatherProvider<G> {
    pipeline: Pipeline<G>,
    snapshots: watch::Sender<WeatherSnapshot>,
}

impl<G: Geolocator> WeatherProvider<G> {
    pub fn new(config: &WeatherConfig, cache: LocalCache, geolocator: G) -> Result<Self, WeatherError> {
        let client = Arc::new(
            Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(USER_AGENT)
                .build()?,
        );

        let pipeline = Pipeline {
            cache: WeatherCache::new(cache, config.cache_ttl()),
            geolocator: Arc::new(geolocator),
            forecast: ForecastClient::new(client.clone(), config.forecast_url.clone()),
            geocoder: ReverseGeocoder::new(client, config.geocode_url.clone()),
            position_options: PositionOptions::from_config(config),
            geo_fallback: config.geo_fallback(),
            fetch_timeout: config.fetch_timeout(),
        };

        let (snapshots, _) = watch::channel(WeatherSnapshot::fetching());
        Ok(Self {
            pipeline,
            snapshots,
        })
    }

    /// Receive every published snapshot, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<WeatherSnapshot> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> WeatherSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Run the pipeline once and publish its result.
    ///
    /// Never fails: anything that escapes the pipeline, a panic included,
    /// ends in a re-read of the cache.
    pub async fn refresh(&self) -> WeatherSnapshot {
        self.snapshots.send_replace(WeatherSnapshot::fetching());

        let pipeline = self.pipeline.clone();
        let snapshot = match tokio::spawn(async move { pipeline.run().await }).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                tracing::warn!("Weather refresh failed: {}", e);
                self.pipeline.recover()
            }
            Err(e) => {
                tracing::error!("Weather refresh task failed: {}", e);
                self.pipeline.recover()
            }
        };

        tracing::info!(state = ?snapshot.state, "Weather settled");
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

struct Pipeline<G> {
    cache: WeatherCache,
    geolocator: Arc<G>,
    forecast: ForecastClient,
    geocoder: ReverseGeocoder,
    position_options: PositionOptions,
    geo_fallback: Duration,
    fetch_timeout: Duration,
}

impl<G> Clone for Pipeline<G> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            geolocator: self.geolocator.clone(),
            forecast: self.forecast.clone(),
            geocoder: self.geocoder.clone(),
            position_options: self.position_options,
            geo_fallback: self.geo_fallback,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<G: Geolocator> Pipeline<G> {
    async fn run(self) -> Result<WeatherSnapshot, WeatherError> {
        let stale = match self.cache.lookup(Utc::now())? {
            CacheLookup::Fresh(reading) => {
                tracing::info!("Using cached weather");
                return Ok(WeatherSnapshot::settled(WeatherState::CacheFresh, reading));
            }
            CacheLookup::Stale(reading) => Some(reading),
            CacheLookup::Missing => None,
        };

        if !self.geolocator.is_available() {
            tracing::info!("Geolocation unavailable, skipping weather fetch");
            return Ok(WeatherSnapshot::settled(
                WeatherState::GeoUnavailable,
                stale.unwrap_or_default(),
            ));
        }

        let Some(position) = self.locate().await else {
            return Ok(without_position(stale));
        };

        Ok(self.fetch(position, stale).await)
    }

    /// Race the position lookup against the fallback timer. `None` when the
    /// timer won or the lookup failed; a late position is discarded.
    async fn locate(&self) -> Option<Position> {
        let geolocator = self.geolocator.clone();
        let options = self.position_options;

        let lookup = async move {
            match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
                Ok(result) => result,
                Err(_) => Err(LocationError::Timeout),
            }
        };

        match race_deadline(lookup, self.geo_fallback, "geolocation").await {
            RaceOutcome::Finished(Ok(position)) => Some(position),
            RaceOutcome::Finished(Err(e)) => {
                tracing::info!("Geolocation failed: {}", e);
                None
            }
            RaceOutcome::DeadlineFirst | RaceOutcome::Dropped => None,
        }
    }

    /// Forecast and place name together, both dropped at `fetch_timeout`.
    async fn fetch(&self, position: Position, stale: Option<WeatherReading>) -> WeatherSnapshot {
        let Position {
            latitude,
            longitude,
            ..
        } = position;

        let requests = async {
            tokio::join!(
                self.forecast.current(latitude, longitude),
                self.geocoder.place_name(latitude, longitude)
            )
        };

        let (weather, place) = match tokio::time::timeout(self.fetch_timeout, requests).await {
            Ok(pair) => pair,
            Err(_) => {
                let err = WeatherError::FetchAborted(self.fetch_timeout);
                tracing::warn!("{}", err);
                return fetch_failed(stale);
            }
        };

        let current = match weather {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!("Weather fetch failed: {}", e);
                return fetch_failed(stale);
            }
        };

        let location = place.unwrap_or_else(|e| {
            tracing::debug!("Reverse geocode failed: {}", e);
            None
        });

        let now = Utc::now();
        let reading = WeatherReading::observed(current.temperature, current.weather_code, location, now);
        if let Err(e) = self.cache.store(&reading, now) {
            tracing::warn!("Failed to cache weather: {}", e);
        }

        WeatherSnapshot::settled(WeatherState::FetchSucceeded, reading)
    }

    /// Last resort: whatever the cache holds, regardless of age.
    fn recover(&self) -> WeatherSnapshot {
        match self.cache.load() {
            Ok(Some(entry)) => WeatherSnapshot::settled(WeatherState::CacheStaleFallback, reading_of(entry)),
            Ok(None) => WeatherSnapshot::settled(WeatherState::Unavailable, WeatherReading::unavailable()),
            Err(e) => {
                tracing::warn!("Weather cache unreadable: {}", e);
                WeatherSnapshot::settled(WeatherState::Unavailable, WeatherReading::unavailable())
            }
        }
    }
}

fn without_position(stale: Option<WeatherReading>) -> WeatherSnapshot {
    match stale {
        Some(reading) => WeatherSnapshot::settled(WeatherState::CacheStaleFallback, reading),
        None => WeatherSnapshot::settled(WeatherState::Unavailable, WeatherReading::unavailable()),
    }
}

fn fetch_failed(stale: Option<WeatherReading>) -> WeatherSnapshot {
    WeatherSnapshot::settled(WeatherState::FetchFailed, stale.unwrap_or_default())
}
