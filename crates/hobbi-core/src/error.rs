//! Centralized error types for the Hobbi dashboard.
//!
//! Acquisition failures (remote store, weather, geolocation) are absorbed by
//! the crates that produce them. What reaches this module are the failures a
//! user asked for directly, such as a manual save, plus the infrastructure
//! errors those operations are built from.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get text that is safe to show on the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Local cache error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store and weather failures that have no infrastructure cause.
    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Io(_) => "Could not read or write the file.",
            AppError::Service(_) => "The dashboard data could not be processed.",
            AppError::Other(_) => "Something unexpected went wrong.",
        }
    }
}

/// Failures talking to a remote HTTP service.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "The remote store is offline or unreachable.",
            NetworkError::Timeout => "The remote store took too long to answer.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The remote store is having trouble right now."
            }
            NetworkError::ServerError { .. } => "The remote store rejected the request.",
            NetworkError::Unauthorized(_) => "Access to the remote store was denied. Check the API key.",
            NetworkError::InvalidResponse(_) => "The remote store sent data the dashboard cannot read.",
        }
    }

    /// Map a non-success HTTP status to a network error.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => NetworkError::Unauthorized(format!("{}: {}", status, body)),
            code => NetworkError::ServerError {
                status: code,
                message: body,
            },
        }
    }
}

/// Local durable cache errors (SQLite).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Cache could not be opened: {0}")]
    ConnectionFailed(String),

    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    #[error("Cache file is corrupt: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => "The local cache could not be opened.",
            DatabaseError::QueryFailed(_) => "The local cache could not be updated.",
            DatabaseError::Corruption(_) => "The local cache is damaged. Delete hobbi.db to reset it.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::from_status(status, self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
