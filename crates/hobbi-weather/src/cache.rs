//! Last successful weather reading, kept in the shared local cache.

use chrono::{DateTime, Utc};
use hobbi_core::{CacheEntry, LocalCache};

use crate::types::{WeatherError, WeatherReading};

pub const WEATHER_KEY: &str = "hobbi-weather";

/// Result of checking the cache before a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(WeatherReading),
    Stale(WeatherReading),
    Missing,
}

#[derive(Debug, Clone)]
pub struct WeatherCache {
    cache: LocalCache,
    ttl: chrono::Duration,
}

impl WeatherCache {
    pub fn new(cache: LocalCache, ttl: chrono::Duration) -> Self {
        Self { cache, ttl }
    }

    /// Read the cached entry. A malformed entry is logged and treated as
    /// absent; it stays in place until the next successful fetch overwrites it.
    pub fn load(&self) -> Result<Option<CacheEntry<WeatherReading>>, WeatherError> {
        match self.cache.get_json::<CacheEntry<WeatherReading>>(WEATHER_KEY)? {
            Some(Ok(entry)) => Ok(Some(entry)),
            Some(Err(e)) => {
                let err = WeatherError::MalformedCache(e.to_string());
                tracing::warn!("Ignoring weather cache: {}", err);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Classify the cached reading by age relative to `now`.
    pub fn lookup(&self, now: DateTime<Utc>) -> Result<CacheLookup, WeatherError> {
        let Some(entry) = self.load()? else {
            return Ok(CacheLookup::Missing);
        };

        let fresh = entry.is_fresh(now, self.ttl);
        tracing::debug!(
            age_secs = entry.age(now).num_seconds(),
            fresh,
            "Found cached weather"
        );

        let reading = reading_of(entry);
        Ok(if fresh {
            CacheLookup::Fresh(reading)
        } else {
            CacheLookup::Stale(reading)
        })
    }

    /// Overwrite the cached reading, stamped with `at`.
    pub fn store(&self, reading: &WeatherReading, at: DateTime<Utc>) -> Result<(), WeatherError> {
        let entry = CacheEntry::new(reading.clone(), at);
        self.cache.set_json(WEATHER_KEY, &entry)?;
        Ok(())
    }
}

/// The cached reading, carrying the entry's capture time.
pub fn reading_of(entry: CacheEntry<WeatherReading>) -> WeatherReading {
    WeatherReading {
        timestamp: Some(entry.timestamp),
        ..entry.value
    }
}
