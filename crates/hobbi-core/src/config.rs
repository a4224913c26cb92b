use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable that overrides `store.api_key`
pub const API_KEY_ENV: &str = "HOBBI_FIRESTORE_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Remote document store and local cache settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Weather pipeline settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Firestore project identifier
    pub project_id: String,

    /// Web API key. `HOBBI_FIRESTORE_API_KEY` overrides it at load time and
    /// is never written back to the file.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Firestore REST root, overridable for emulators
    #[serde(default = "default_firestore_url")]
    pub base_url: String,

    /// Collection holding the dashboard document
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Dashboard document id
    #[serde(default = "default_document")]
    pub document: String,

    /// How long startup waits for the remote document before using local data
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,

    /// SQLite file backing the local durable cache. Relative paths resolve
    /// against `config_dir`.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_collection() -> String {
    "dashboard".to_string()
}

fn default_document() -> String {
    "data".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    3000
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("hobbi.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: "homepagfe".to_string(),
            api_key: None,
            base_url: default_firestore_url(),
            collection: default_collection(),
            document: default_document(),
            remote_timeout_ms: default_remote_timeout_ms(),
            cache_path: default_cache_path(),
        }
    }
}

impl StoreConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Maximum age of a cached reading that is served without a refresh
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,

    /// Wait for a position before falling back to the cached reading
    #[serde(default = "default_geo_fallback_ms")]
    pub geo_fallback_ms: u64,

    /// Hard limit for the position lookup itself
    #[serde(default = "default_geo_timeout_ms")]
    pub geo_timeout_ms: u64,

    /// Positions younger than this are reused instead of asking again
    #[serde(default = "default_geo_max_age_minutes")]
    pub geo_max_age_minutes: u32,

    /// Abort bound shared by the forecast and reverse-geocode requests
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,

    /// Fixed coordinates. Without both, geolocation is unavailable.
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

fn default_cache_ttl_minutes() -> u32 {
    30
}

fn default_geo_fallback_ms() -> u64 {
    5000
}

fn default_geo_timeout_ms() -> u64 {
    10_000
}

fn default_geo_max_age_minutes() -> u32 {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    8000
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_geocode_url() -> String {
    "https://api.bigdatacloud.net/data/reverse-geocode-client".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: default_cache_ttl_minutes(),
            geo_fallback_ms: default_geo_fallback_ms(),
            geo_timeout_ms: default_geo_timeout_ms(),
            geo_max_age_minutes: default_geo_max_age_minutes(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            forecast_url: default_forecast_url(),
            geocode_url: default_geocode_url(),
            latitude: None,
            longitude: None,
        }
    }
}

impl WeatherConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache_ttl_minutes))
    }

    pub fn geo_fallback(&self) -> Duration {
        Duration::from_millis(self.geo_fallback_ms)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.geo_timeout_ms)
    }

    pub fn geo_max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.geo_max_age_minutes) * 60)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Configured coordinates, when both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hobbi");

        Self {
            config_dir,
            store: StoreConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating a default file there
    /// if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            toml::from_str::<Config>(&contents).context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            config
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.store.api_key = Some(key);
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.store.base_url, "store.base_url", &mut result);
        self.validate_url(&self.weather.forecast_url, "weather.forecast_url", &mut result);
        self.validate_url(&self.weather.geocode_url, "weather.geocode_url", &mut result);

        if self.store.project_id.trim().is_empty() {
            result.add_error("store.project_id", "Project id cannot be empty");
        }

        if self.store.collection.trim().is_empty() || self.store.document.trim().is_empty() {
            result.add_error("store.document", "Collection and document ids cannot be empty");
        }

        if self.store.api_key.is_none() {
            result.add_warning(
                "store.api_key",
                "No API key configured - remote reads may be rejected",
            );
        }

        if self.store.remote_timeout_ms == 0 {
            result.add_error("store.remote_timeout_ms", "Remote timeout must be greater than 0");
        } else if self.store.remote_timeout_ms > 60_000 {
            result.add_warning(
                "store.remote_timeout_ms",
                "Remote timeout is more than a minute; startup may feel stuck",
            );
        }

        if self.weather.cache_ttl_minutes == 0 {
            result.add_warning(
                "weather.cache_ttl_minutes",
                "Weather cache disabled (0 minutes)",
            );
        }

        for (field, value) in [
            ("weather.geo_fallback_ms", self.weather.geo_fallback_ms),
            ("weather.geo_timeout_ms", self.weather.geo_timeout_ms),
            ("weather.fetch_timeout_ms", self.weather.fetch_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(field, "Timeout must be greater than 0");
            }
        }

        match (self.weather.latitude, self.weather.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("weather.latitude", "Latitude must be within -90..=90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("weather.longitude", "Longitude must be within -180..=180");
                }
            }
            (None, None) => {
                result.add_warning(
                    "weather",
                    "No coordinates configured - weather will use cached data only",
                );
            }
            _ => {
                result.add_error(
                    "weather",
                    "Latitude and longitude must be configured together",
                );
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Absolute location of the local cache database
    pub fn cache_path(&self) -> PathBuf {
        if self.store.cache_path.is_absolute() {
            self.store.cache_path.clone()
        } else {
            self.config_dir.join(&self.store.cache_path)
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("hobbi");

        Ok(config_dir.join("config.toml"))
    }
}
