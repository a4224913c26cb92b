//! State store error types.

use hobbi_core::{AppError, DatabaseError, NetworkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(#[source] NetworkError),

    #[error("Remote write failed: {0}")]
    WriteError(#[source] NetworkError),

    #[error("Malformed persisted data under '{key}': {reason}")]
    MalformedPersisted { key: String, reason: String },

    #[error("Local cache error: {0}")]
    LocalCache(#[from] DatabaseError),

    #[error("Invalid import file: {0}")]
    ImportInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn malformed(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedPersisted {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::RemoteUnavailable(e) => format!("Could not reach the remote store. {}", e.user_message()),
            Self::WriteError(e) => format!("Failed to save: {}", e.user_message()),
            Self::MalformedPersisted { .. } => "Some saved data could not be read".to_string(),
            Self::LocalCache(e) => e.user_message().to_string(),
            Self::ImportInvalid(msg) => format!("Failed to import goals: {}", msg),
            Self::Io(_) => "A file operation failed. Please try again.".to_string(),
        }
    }

    /// Whether the user asked for the operation that produced this error and
    /// should be told about it.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::WriteError(_) | Self::ImportInvalid(_) | Self::Io(_))
    }
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::RemoteUnavailable(n) | SyncError::WriteError(n) => AppError::Network(n),
            SyncError::LocalCache(d) => AppError::Database(d),
            SyncError::Io(io) => AppError::Io(io),
            other => AppError::Service(other.to_string()),
        }
    }
}
