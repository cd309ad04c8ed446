//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Hit table file with a bad magic, version, or size.
    #[error("invalid hit table: {0}")]
    InvalidTable(String),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] mutrack_core::Error),
}
