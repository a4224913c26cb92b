//! Dashboard state persistence for Hobbi.
//!
//! Goals, favorites and apps live in one remote document with a local
//! durable cache behind it. `SyncLoader` decides which of the two to trust
//! at startup and writes back on demand.

pub mod document;
pub mod error;
pub mod favicon;
pub mod firestore;
pub mod history;
pub mod loader;
pub mod model;
pub mod store;
pub mod transfer;

pub use document::{DocumentStore, FirestoreClient, RemoteDocument};
pub use error::SyncError;
pub use favicon::{favicon_url, normalize_url};
pub use history::{day_label, track_daily_progress};
pub use loader::{LoadOutcome, LoadSource, SyncLoader};
pub use model::{Goal, HistoryEntry, PersistedState, Priority, ShortcutItem};
pub use store::{StateSnapshot, StateStore, APPS_KEY, FAVORITES_KEY, GOALS_KEY};
pub use transfer::{export_goals, parse_import, read_import, write_export, ImportPlan};
