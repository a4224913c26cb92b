use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use hobbi_core::{Config, LocalCache};
use hobbi_store::{
    read_import, track_daily_progress, write_export, FirestoreClient, LoadSource, PersistedState,
    StateStore, SyncError, SyncLoader,
};
use hobbi_weather::{ConfiguredGeolocator, RememberingGeolocator, WeatherProvider, WeatherSnapshot};

type Geolocation = RememberingGeolocator<ConfiguredGeolocator>;

/// What the dashboard shows after startup.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub state: PersistedState,
    pub source: LoadSource,
    pub weather: WeatherSnapshot,
}

/// Client handles built once per process.
pub struct App {
    config: Arc<Config>,
    cache: LocalCache,
    loader: SyncLoader<FirestoreClient>,
    weather: WeatherProvider<Geolocation>,
}

impl App {
    pub fn new() -> Result<Self> {
        let (config, _) = Config::load_validated()?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let cache_path = config.cache_path();
        let cache = LocalCache::open(&cache_path)
            .with_context(|| format!("Failed to open local cache at {}", cache_path.display()))?;

        let remote = FirestoreClient::new(&config.store).context("Failed to create remote store client")?;
        let loader = SyncLoader::new(
            StateStore::new(Arc::new(remote), cache.clone()),
            config.store.remote_timeout(),
        );

        let geolocator = RememberingGeolocator::new(ConfiguredGeolocator::from_config(&config.weather));
        let weather = WeatherProvider::new(&config.weather, cache.clone(), geolocator)
            .context("Failed to create weather provider")?;

        tracing::debug!("Config directory: {}", config.config_dir.display());
        Ok(Self {
            config: Arc::new(config),
            cache,
            loader,
            weather,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load state and weather concurrently, then record today's progress.
    pub async fn start(&self) -> Dashboard {
        let (loaded, weather) = tokio::join!(
            self.loader.load(PersistedState::builtin()),
            self.weather.refresh()
        );

        let mut state = loaded.state;
        let today = Local::now().date_naive();
        if let Err(e) = track_daily_progress(&mut state.goals, today, &self.cache) {
            tracing::warn!("Failed to track progress history: {}", e);
        }
        // Only data the remote store confirmed is mirrored locally.
        if loaded.source == LoadSource::RemoteLoaded {
            self.mirror_local(&state);
        }

        tracing::info!(source = ?loaded.source, weather = ?weather.state, "Dashboard ready");
        Dashboard {
            state,
            source: loaded.source,
            weather,
        }
    }

    /// Push `state` to the remote store, then mirror what was written into
    /// the local cache. A failed save leaves the local cache untouched.
    pub async fn save(&self, state: &PersistedState) -> Result<PersistedState, SyncError> {
        let saved = self.loader.save(state).await?;
        self.mirror_local(&saved);
        Ok(saved)
    }

    fn mirror_local(&self, state: &PersistedState) {
        if let Err(e) = self.loader.stash_local(state) {
            tracing::warn!("Failed to update local cache: {}", e);
        }
    }

    /// Write the goals to `goals-YYYY-MM-DD.json` in `dir`.
    pub fn export(&self, state: &PersistedState, dir: &Path) -> Result<PathBuf, SyncError> {
        write_export(&state.goals, dir, Local::now().date_naive())
    }

    /// Replace the goals with the contents of `path` if `confirm` agrees,
    /// then save. Returns `Ok(false)` when the import was declined.
    pub async fn import(
        &self,
        state: &mut PersistedState,
        path: &Path,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<bool, SyncError> {
        let plan = read_import(path)?;
        if !plan.apply(&mut state.goals, confirm) {
            return Ok(false);
        }

        *state = self.save(state).await?;
        Ok(true)
    }
}
