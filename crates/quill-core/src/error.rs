//! Error types for quill-core

use thiserror::Error;

/// Result type alias using quill-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quill-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error talking to the sync server
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Sync server answered with a non-success status
    #[error("Sync API error: {message} ({status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided message
        message: String,
    },

    /// Server data that violates the sync invariants (e.g. a note in an unknown book)
    #[error("Sync integrity error: {0}")]
    SyncIntegrity(String),
}
