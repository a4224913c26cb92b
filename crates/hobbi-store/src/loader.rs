//! Startup read-through and on-demand write-through for dashboard state.

use std::time::Duration;

use chrono::Utc;
use hobbi_core::{race_deadline, RaceOutcome};

use crate::document::DocumentStore;
use crate::error::SyncError;
use crate::model::PersistedState;
use crate::store::{StateSnapshot, StateStore};

/// Where the loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The remote document answered in time and existed.
    RemoteLoaded,
    /// The remote store was slow, missing or failing; local keys were used.
    LocalFallback,
    /// Nothing answered with data; the built-in dataset stands.
    EmptyDefault,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub state: PersistedState,
    pub source: LoadSource,
}

/// Orchestrates remote-first loading with a bounded wait and local fallback.
pub struct SyncLoader<D> {
    store: StateStore<D>,
    remote_timeout: Duration,
}

impl<D: DocumentStore> SyncLoader<D> {
    pub fn new(store: StateStore<D>, remote_timeout: Duration) -> Self {
        Self {
            store,
            remote_timeout,
        }
    }

    pub fn store(&self) -> &StateStore<D> {
        &self.store
    }

    /// Load dashboard state, starting from `defaults`.
    ///
    /// The remote read gets `remote_timeout` to answer. If it is late, missing
    /// or failing, each local key is tried independently. A remote answer that
    /// arrives after the deadline is discarded.
    pub async fn load(&self, defaults: PersistedState) -> LoadOutcome {
        let mut state = defaults;
        let store = self.store.clone();

        let remote = race_deadline(
            async move { store.read().await },
            self.remote_timeout,
            "remote state read",
        )
        .await;

        match remote {
            RaceOutcome::Finished(Ok(Some(snapshot))) => {
                tracing::info!(
                    goals = snapshot.goals.as_ref().map(Vec::len),
                    favorites = snapshot.favorites.as_ref().map(Vec::len),
                    apps = snapshot.apps.as_ref().map(Vec::len),
                    "Loaded dashboard state from remote store"
                );
                snapshot.apply_to(&mut state);
                return LoadOutcome {
                    state,
                    source: LoadSource::RemoteLoaded,
                };
            }
            RaceOutcome::Finished(Ok(None)) => {
                tracing::info!("Remote document not found, trying local cache");
            }
            RaceOutcome::Finished(Err(e)) => {
                tracing::error!("Failed to load data from remote store: {}", e);
            }
            RaceOutcome::DeadlineFirst => {
                tracing::warn!("Remote load timed out, using local cache fallback");
            }
            RaceOutcome::Dropped => {
                tracing::error!("Remote load task ended unexpectedly, using local cache fallback");
            }
        }

        let local = self.store.read_local();
        let source = fallback_source(&local);
        local.apply_to(&mut state);

        tracing::info!(?source, "Dashboard state loaded without remote data");
        LoadOutcome { state, source }
    }

    /// Write `state` to the remote store, stamped with the current time.
    ///
    /// Failure is returned to the caller as-is; nothing is retried and the
    /// local cache is not touched. Returns the state that was written.
    pub async fn save(&self, state: &PersistedState) -> Result<PersistedState, SyncError> {
        let mut stamped = state.clone();
        stamped.last_updated = Some(Utc::now());

        match self.store.write(&stamped).await {
            Ok(()) => {
                tracing::info!(goals = stamped.goals.len(), "Saved dashboard state to remote store");
                Ok(stamped)
            }
            Err(e) => {
                tracing::error!("Failed to save to remote store: {}", e);
                Err(e)
            }
        }
    }

    /// Mirror `state` into the local cache so the next offline start has it.
    pub fn stash_local(&self, state: &PersistedState) -> Result<(), SyncError> {
        self.store.write_local(state)?;
        tracing::debug!("Mirrored dashboard state into local cache");
        Ok(())
    }
}

fn fallback_source(local: &StateSnapshot) -> LoadSource {
    if local.is_empty() {
        LoadSource::EmptyDefault
    } else {
        LoadSource::LocalFallback
    }
}
