//! End-to-end tests for the weather pipeline against mocked services.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hobbi_core::{LocalCache, WeatherConfig};
use hobbi_weather::{
    CacheLookup, Condition, FixedGeolocator, Geolocator, LocationError, NoGeolocator, Position,
    PositionOptions, WeatherCache, WeatherProvider, WeatherReading, WeatherState,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORECAST_PATH: &str = "/v1/forecast";
const GEOCODE_PATH: &str = "/data/reverse-geocode-client";

fn config(base: &str) -> WeatherConfig {
    WeatherConfig {
        forecast_url: format!("{}{}", base, FORECAST_PATH),
        geocode_url: format!("{}{}", base, GEOCODE_PATH),
        latitude: Some(47.6),
        longitude: Some(-122.3),
        ..WeatherConfig::default()
    }
}

fn here() -> FixedGeolocator {
    FixedGeolocator::new(47.6, -122.3)
}

fn cached_reading() -> WeatherReading {
    WeatherReading {
        temp: Some(58),
        condition: Some(Condition::Overcast),
        location: Some("Portland, Oregon".to_string()),
        timestamp: None,
    }
}

/// Local cache holding `cached_reading()` captured `age_minutes` ago.
fn cache_aged(age_minutes: i64) -> LocalCache {
    let local = LocalCache::in_memory().unwrap();
    WeatherCache::new(local.clone(), chrono::Duration::minutes(30))
        .store(&cached_reading(), Utc::now() - chrono::Duration::minutes(age_minutes))
        .unwrap();
    local
}

async fn mount_forecast(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_geocode(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(GEOCODE_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

fn forecast_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "current": { "temperature_2m": 71.6, "weather_code": 2 }
    }))
}

fn geocode_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "locality": "Seattle",
        "principalSubdivision": "Washington",
        "city": "Seattle"
    }))
}

fn assert_is_cached_reading(reading: &WeatherReading) {
    assert_eq!(reading.temp, Some(58));
    assert_eq!(reading.condition, Some(Condition::Overcast));
    assert_eq!(reading.location.as_deref(), Some("Portland, Oregon"));
    assert!(reading.timestamp.is_some());
}

struct DeniedGeolocator;

impl Geolocator for DeniedGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

struct SlowGeolocator;

impl Geolocator for SlowGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Position {
            latitude: 47.6,
            longitude: -122.3,
            accuracy_meters: None,
            captured_at: Utc::now(),
        })
    }
}

/// Answers after the fallback timer but inside the platform timeout.
struct LateGeolocator {
    answered: Arc<AtomicBool>,
}

impl Geolocator for LateGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        tokio::time::sleep(Duration::from_secs(7)).await;
        self.answered.store(true, Ordering::SeqCst);
        Ok(Position {
            latitude: 47.6,
            longitude: -122.3,
            accuracy_meters: None,
            captured_at: Utc::now(),
        })
    }
}

struct BrokenGeolocator;

impl Geolocator for BrokenGeolocator {
    fn is_available(&self) -> bool {
        panic!("platform check crashed")
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Position, LocationError> {
        Err(LocationError::Other("unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_fresh_cache_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(forecast_ok())
        .expect(0)
        .mount(&server)
        .await;

    let provider = WeatherProvider::new(&config(&server.uri()), cache_aged(5), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::CacheFresh);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test]
async fn test_fetch_success_is_cached() {
    let server = MockServer::start().await;
    mount_forecast(&server, forecast_ok()).await;
    mount_geocode(&server, geocode_ok()).await;

    let local = LocalCache::in_memory().unwrap();
    let provider = WeatherProvider::new(&config(&server.uri()), local.clone(), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::FetchSucceeded);
    let reading = snapshot.reading.unwrap();
    assert_eq!(reading.temp, Some(72));
    assert_eq!(reading.condition, Some(Condition::PartlyCloudy));
    assert_eq!(reading.location.as_deref(), Some("Seattle, Washington"));

    let cache = WeatherCache::new(local, chrono::Duration::minutes(30));
    match cache.lookup(Utc::now()).unwrap() {
        CacheLookup::Fresh(cached) => {
            assert_eq!(cached.temp, Some(72));
            assert_eq!(cached.location.as_deref(), Some("Seattle, Washington"));
        }
        other => panic!("expected a fresh entry, got {:?}", other),
    }
}

#[tokio::test]
async fn test_weather_error_uses_stale_cache_even_if_geocode_succeeds() {
    let server = MockServer::start().await;
    mount_forecast(&server, ResponseTemplate::new(500)).await;
    mount_geocode(&server, geocode_ok()).await;

    let local = cache_aged(45);
    let provider = WeatherProvider::new(&config(&server.uri()), local.clone(), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::FetchFailed);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());

    // the stale entry is not refreshed by a failed fetch
    let cache = WeatherCache::new(local, chrono::Duration::minutes(30));
    assert!(matches!(cache.lookup(Utc::now()).unwrap(), CacheLookup::Stale(_)));
}

#[tokio::test]
async fn test_weather_error_without_cache_is_all_null() {
    let server = MockServer::start().await;
    mount_forecast(&server, ResponseTemplate::new(503)).await;
    mount_geocode(&server, geocode_ok()).await;

    let provider =
        WeatherProvider::new(&config(&server.uri()), LocalCache::in_memory().unwrap(), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::FetchFailed);
    assert_eq!(snapshot.reading, Some(WeatherReading::unavailable()));
}

#[tokio::test]
async fn test_geocode_failure_keeps_weather() {
    let server = MockServer::start().await;
    mount_forecast(&server, forecast_ok()).await;
    mount_geocode(&server, ResponseTemplate::new(500)).await;

    let provider =
        WeatherProvider::new(&config(&server.uri()), LocalCache::in_memory().unwrap(), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::FetchSucceeded);
    let reading = snapshot.reading.unwrap();
    assert_eq!(reading.temp, Some(72));
    assert_eq!(reading.location, None);
}

#[tokio::test]
async fn test_malformed_forecast_uses_stale_cache() {
    let server = MockServer::start().await;
    mount_forecast(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "current": { "temperature_2m": "warm" } })),
    )
    .await;
    mount_geocode(&server, geocode_ok()).await;

    let provider = WeatherProvider::new(&config(&server.uri()), cache_aged(90), here()).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::FetchFailed);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test]
async fn test_slow_fetch_is_aborted() {
    let server = MockServer::start().await;
    mount_forecast(&server, forecast_ok().set_delay(Duration::from_secs(3))).await;
    mount_geocode(&server, geocode_ok()).await;

    let mut config = config(&server.uri());
    config.fetch_timeout_ms = 300;

    let provider = WeatherProvider::new(&config, cache_aged(45), here()).unwrap();
    let started = std::time::Instant::now();
    let snapshot = provider.refresh().await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(snapshot.state, WeatherState::FetchFailed);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test]
async fn test_no_geolocation_and_no_cache_is_all_null() {
    let provider = WeatherProvider::new(
        &config("http://127.0.0.1:9"),
        LocalCache::in_memory().unwrap(),
        NoGeolocator,
    )
    .unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::GeoUnavailable);
    assert_eq!(snapshot.reading, Some(WeatherReading::unavailable()));
}

#[tokio::test]
async fn test_no_geolocation_uses_stale_cache() {
    let provider =
        WeatherProvider::new(&config("http://127.0.0.1:9"), cache_aged(45), NoGeolocator).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::GeoUnavailable);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test]
async fn test_denied_geolocation_uses_stale_cache() {
    let provider =
        WeatherProvider::new(&config("http://127.0.0.1:9"), cache_aged(45), DeniedGeolocator).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::CacheStaleFallback);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_slow_geolocation_falls_back_after_timer() {
    let provider = WeatherProvider::new(
        &config("http://127.0.0.1:9"),
        LocalCache::in_memory().unwrap(),
        SlowGeolocator,
    )
    .unwrap();

    let started = tokio::time::Instant::now();
    let snapshot = provider.refresh().await;
    let waited = started.elapsed();

    assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(10));
    assert_eq!(snapshot.state, WeatherState::Unavailable);
    assert_eq!(snapshot.reading, Some(WeatherReading::unavailable()));
}

#[tokio::test(start_paused = true)]
async fn test_slow_geolocation_uses_stale_cache_after_timer() {
    let provider =
        WeatherProvider::new(&config("http://127.0.0.1:9"), cache_aged(45), SlowGeolocator).unwrap();

    let started = tokio::time::Instant::now();
    let snapshot = provider.refresh().await;
    let waited = started.elapsed();

    assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(10));
    assert_eq!(snapshot.state, WeatherState::CacheStaleFallback);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_late_position_publishes_nothing() {
    let answered = Arc::new(AtomicBool::new(false));
    let geolocator = LateGeolocator {
        answered: answered.clone(),
    };
    let provider =
        WeatherProvider::new(&config("http://127.0.0.1:9"), cache_aged(45), geolocator).unwrap();
    let mut rx = provider.subscribe();

    let snapshot = provider.refresh().await;
    assert_eq!(snapshot.state, WeatherState::CacheStaleFallback);
    assert_eq!(*rx.borrow_and_update(), snapshot);

    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(answered.load(Ordering::SeqCst));
    assert!(!rx.has_changed().unwrap());
    assert_eq!(provider.current(), snapshot);
}

#[tokio::test]
async fn test_panic_is_caught_at_the_boundary() {
    let provider =
        WeatherProvider::new(&config("http://127.0.0.1:9"), cache_aged(45), BrokenGeolocator).unwrap();
    let snapshot = provider.refresh().await;

    assert_eq!(snapshot.state, WeatherState::CacheStaleFallback);
    assert_is_cached_reading(snapshot.reading.as_ref().unwrap());
}

#[tokio::test]
async fn test_subscribers_see_fetching_then_settled() {
    let server = MockServer::start().await;
    mount_forecast(&server, forecast_ok()).await;
    mount_geocode(&server, geocode_ok()).await;

    let provider =
        WeatherProvider::new(&config(&server.uri()), LocalCache::in_memory().unwrap(), here()).unwrap();
    let mut rx = provider.subscribe();

    assert_eq!(rx.borrow().state, WeatherState::Fetching);
    assert!(rx.borrow().reading.is_none());

    provider.refresh().await;

    assert!(rx.has_changed().unwrap());
    let settled = rx.borrow_and_update().clone();
    assert!(settled.is_settled());
    assert_eq!(settled.state, WeatherState::FetchSucceeded);
    assert_eq!(provider.current(), settled);
}
