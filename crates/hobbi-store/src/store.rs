//! The state store: one remote document plus three local cache keys.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hobbi_core::LocalCache;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::document::{DocumentStore, RemoteDocument};
use crate::error::SyncError;
use crate::favicon::fill_favicons;
use crate::model::{Goal, PersistedState, ShortcutItem};

pub const GOALS_KEY: &str = "hobbi-goals";
pub const FAVORITES_KEY: &str = "hobbi-favorites";
pub const APPS_KEY: &str = "hobbi-apps";

/// Whatever a single source produced. Each collection is `None` when the
/// source had nothing usable for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub goals: Option<Vec<Goal>>,
    pub favorites: Option<Vec<ShortcutItem>>,
    pub apps: Option<Vec<ShortcutItem>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    pub fn is_empty(&self) -> bool {
        self.goals.is_none() && self.favorites.is_none() && self.apps.is_none()
    }

    /// Overwrite the collections this snapshot carries; leave the rest.
    pub fn apply_to(self, state: &mut PersistedState) {
        if let Some(goals) = self.goals {
            state.goals = goals;
        }
        if let Some(favorites) = self.favorites {
            state.favorites = favorites;
        }
        if let Some(apps) = self.apps {
            state.apps = apps;
        }
        if self.last_updated.is_some() {
            state.last_updated = self.last_updated;
        }
    }

    /// Adopt the well-typed collections of a remote document.
    pub fn from_remote(mut doc: RemoteDocument) -> Self {
        let last_updated = doc
            .get("lastUpdated")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            goals: remote_collection(&mut doc, "goals"),
            favorites: remote_collection(&mut doc, "favorites").map(fill_favicons),
            apps: remote_collection(&mut doc, "apps").map(fill_favicons),
            last_updated,
        }
    }
}

fn remote_collection<T: DeserializeOwned>(doc: &mut RemoteDocument, field: &str) -> Option<Vec<T>> {
    match doc.remove(field) {
        Some(value @ Value::Array(_)) => match serde_json::from_value(value) {
            Ok(items) => Some(items),
            Err(e) => {
                tracing::warn!("Ignoring malformed remote '{}': {}", field, e);
                None
            }
        },
        Some(_) => {
            tracing::warn!("Ignoring remote '{}': not an array", field);
            None
        }
        None => None,
    }
}

/// Remote document store plus local durable cache.
pub struct StateStore<D> {
    remote: Arc<D>,
    local: LocalCache,
}

impl<D> Clone for StateStore<D> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            local: self.local.clone(),
        }
    }
}

impl<D: DocumentStore> StateStore<D> {
    pub fn new(remote: Arc<D>, local: LocalCache) -> Self {
        Self { remote, local }
    }

    pub fn local_cache(&self) -> &LocalCache {
        &self.local
    }

    /// Read the remote document. `Ok(None)` when it does not exist.
    pub async fn read(&self) -> Result<Option<StateSnapshot>, SyncError> {
        Ok(self.remote.read().await?.map(StateSnapshot::from_remote))
    }

    /// Write the full state to the remote document. Never retried.
    pub async fn write(&self, state: &PersistedState) -> Result<(), SyncError> {
        self.remote.write(state).await
    }

    /// Read the three local keys independently. Absent or malformed keys are
    /// logged and left out of the snapshot.
    pub fn read_local(&self) -> StateSnapshot {
        StateSnapshot {
            goals: self.read_key(GOALS_KEY),
            favorites: self.read_key(FAVORITES_KEY).map(fill_favicons),
            apps: self.read_key(APPS_KEY).map(fill_favicons),
            last_updated: None,
        }
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.local.get_json::<T>(key) {
            Ok(Some(Ok(value))) => Some(value),
            Ok(Some(Err(e))) => {
                let err = SyncError::malformed(key, e);
                tracing::error!("Failed to load from local cache: {}", err);
                None
            }
            Ok(None) => {
                tracing::debug!("Local cache has no '{}'", key);
                None
            }
            Err(e) => {
                tracing::error!("Failed to read '{}' from local cache: {}", key, e);
                None
            }
        }
    }

    /// Mirror the three collections into the local cache.
    pub fn write_local(&self, state: &PersistedState) -> Result<(), SyncError> {
        self.local.set_json(GOALS_KEY, &state.goals)?;
        self.local.set_json(FAVORITES_KEY, &state.favorites)?;
        self.local.set_json(APPS_KEY, &state.apps)?;
        Ok(())
    }
}
