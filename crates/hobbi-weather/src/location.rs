//! Geolocation sources.
//!
//! The dashboard has no positioning hardware of its own, so a position comes
//! from configured coordinates or not at all. Anything that can answer
//! "where am I" implements [`Geolocator`].

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hobbi_core::WeatherConfig;
use parking_lot::Mutex;

use crate::types::LocationError;

/// A resolved position and when it was captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl Position {
    /// Age relative to `now`; positions stamped in the future count as new.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or_default()
    }
}

/// How a position request should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Platform-side bound on the request
    pub timeout: Duration,
    /// A previously captured position this young may be reused
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            timeout: config.geo_timeout(),
            maximum_age: config.geo_max_age(),
        }
    }
}

/// Source of the current position.
pub trait Geolocator: Send + Sync + 'static {
    /// Whether this platform can produce a position at all.
    fn is_available(&self) -> bool;

    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = Result<Position, LocationError>> + Send;
}

/// Coordinates taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    latitude: f64,
    longitude: f64,
}

impl FixedGeolocator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Geolocator for FixedGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        Ok(Position {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_meters: None,
            captured_at: Utc::now(),
        })
    }
}

/// No geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

impl Geolocator for NoGeolocator {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Whatever the configuration provides.
#[derive(Debug, Clone, Copy)]
pub enum ConfiguredGeolocator {
    Fixed(FixedGeolocator),
    Absent(NoGeolocator),
}

impl ConfiguredGeolocator {
    pub fn from_config(config: &WeatherConfig) -> Self {
        match config.coordinates() {
            Some((latitude, longitude)) => Self::Fixed(FixedGeolocator::new(latitude, longitude)),
            None => {
                tracing::info!("No coordinates configured, geolocation unavailable");
                Self::Absent(NoGeolocator)
            }
        }
    }
}

impl Geolocator for ConfiguredGeolocator {
    fn is_available(&self) -> bool {
        match self {
            Self::Fixed(g) => g.is_available(),
            Self::Absent(g) => g.is_available(),
        }
    }

    async fn current_position(&self, options: PositionOptions) -> Result<Position, LocationError> {
        match self {
            Self::Fixed(g) => g.current_position(options).await,
            Self::Absent(g) => g.current_position(options).await,
        }
    }
}

/// Reuses the last position while it is younger than the requested
/// `maximum_age`; otherwise asks the wrapped source.
#[derive(Debug)]
pub struct RememberingGeolocator<G> {
    inner: G,
    last: Mutex<Option<Position>>,
}

impl<G> RememberingGeolocator<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            last: Mutex::new(None),
        }
    }
}

impl<G: Geolocator> Geolocator for RememberingGeolocator<G> {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn current_position(&self, options: PositionOptions) -> Result<Position, LocationError> {
        let remembered = *self.last.lock();
        if let Some(position) = remembered {
            if position.age(Utc::now()) <= options.maximum_age {
                tracing::debug!("Reusing position captured at {}", position.captured_at);
                return Ok(position);
            }
        }

        let position = self.inner.current_position(options).await?;
        *self.last.lock() = Some(position);
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OPTIONS: PositionOptions = PositionOptions {
        timeout: Duration::from_secs(10),
        maximum_age: Duration::from_secs(600),
    };

    /// Hands out positions captured `age` ago and counts requests.
    struct AgedGeolocator {
        age: chrono::Duration,
        calls: AtomicUsize,
    }

    impl Geolocator for AgedGeolocator {
        fn is_available(&self) -> bool {
            true
        }

        async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Position {
                latitude: 40.7,
                longitude: -74.0,
                accuracy_meters: Some(1500.0),
                captured_at: Utc::now() - self.age,
            })
        }
    }

    #[tokio::test]
    async fn test_fixed_geolocator() {
        let geo = FixedGeolocator::new(47.6, -122.3);
        let position = geo.current_position(OPTIONS).await.unwrap();
        assert!(geo.is_available());
        assert_eq!((position.latitude, position.longitude), (47.6, -122.3));
    }

    #[tokio::test]
    async fn test_no_geolocator() {
        let geo = NoGeolocator;
        assert!(!geo.is_available());
        assert!(matches!(
            geo.current_position(OPTIONS).await,
            Err(LocationError::ServiceUnavailable)
        ));
    }

    #[test]
    fn test_configured_geolocator_follows_config() {
        let mut config = WeatherConfig::default();
        assert!(!ConfiguredGeolocator::from_config(&config).is_available());

        config.latitude = Some(51.5);
        config.longitude = Some(-0.1);
        assert!(ConfiguredGeolocator::from_config(&config).is_available());
    }

    #[tokio::test]
    async fn test_remembering_reuses_recent_position() {
        let geo = RememberingGeolocator::new(AgedGeolocator {
            age: chrono::Duration::minutes(1),
            calls: AtomicUsize::new(0),
        });

        let first = geo.current_position(OPTIONS).await.unwrap();
        let second = geo.current_position(OPTIONS).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(geo.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remembering_refreshes_old_position() {
        let geo = RememberingGeolocator::new(AgedGeolocator {
            age: chrono::Duration::minutes(11),
            calls: AtomicUsize::new(0),
        });

        geo.current_position(OPTIONS).await.unwrap();
        geo.current_position(OPTIONS).await.unwrap();

        assert_eq!(geo.inner.calls.load(Ordering::SeqCst), 2);
    }
}
