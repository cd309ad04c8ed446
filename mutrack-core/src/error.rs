//! Error types for mutrack-core.

use thiserror::Error;

/// Result type alias for mutrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for mutrack operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Record with the wrong number of comma-separated fields.
    #[error("malformed record: expected {expected} fields, found {found}")]
    MalformedRecord {
        /// Expected field count.
        expected: usize,
        /// Observed field count.
        found: usize,
    },

    /// Numeric field that failed to parse.
    #[error("invalid {field} field: {value:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Offending raw text.
        value: String,
    },

    /// Packed strip word that is not valid 24-bit hex.
    #[error("invalid hit word: {0:?}")]
    InvalidHitWord(String),

    /// Strip index outside [0, 11].
    #[error("strip index {0} out of range [0, {1}]")]
    StripIndexOutOfRange(i64, u32),

    /// Row range outside the table bounds or inverted.
    #[error("invalid row range [{start}, {end}] for table of {rows} rows")]
    InvalidRowRange {
        /// First ordinal (inclusive).
        start: usize,
        /// Last ordinal (inclusive).
        end: usize,
        /// Table row count.
        rows: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
