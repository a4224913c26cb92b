pub mod cache;
pub mod config;
pub mod error;
pub mod race;

pub use cache::{CacheEntry, LocalCache};
pub use config::{Config, StoreConfig, WeatherConfig};
pub use error::{AppError, DatabaseError, NetworkError, ReqwestErrorExt};
pub use race::{race_deadline, RaceOutcome};

use anyhow::Result;

/// Initialize logging for the dashboard process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Hobbi core initialized");
    Ok(())
}
