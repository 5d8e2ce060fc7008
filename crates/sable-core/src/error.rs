//! Error types for the query core.

use thiserror::Error;

/// Errors produced while building, rendering, or executing statements.
#[derive(Debug, Error)]
pub enum Error {
    /// No connection has been installed on the calling thread.
    #[error("not connected")]
    NotConnected,

    /// A limit bound that the SQLite dialect cannot express.
    #[error("negative limit bound {0} is not supported")]
    UnsupportedLimit(i64),

    /// A limit range whose stop precedes its offset.
    #[error("limit stop {stop} is less than offset {offset}")]
    InvalidLimit {
        /// The requested offset.
        offset: i64,
        /// The requested stop.
        stop: i64,
    },

    /// A statement that cannot be rendered as valid SQL.
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// An indexed fetch that matched no row.
    #[error("row {0} out of range")]
    IndexOutOfRange(i64),

    /// An error reported by the database driver, passed through unchanged.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a driver-level failure.
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Driver(Box::new(err))
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
