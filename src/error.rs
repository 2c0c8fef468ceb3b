//! Error types for the fuzzyrank library.
//!
//! All errors are represented by the [`FuzzyRankError`] enum. Invalid limits,
//! thresholds and weights never show up here: the normalizer falls back to
//! defaults for those. What remains are configuration problems that have no
//! sensible fallback, records that cannot be merged because they lack an
//! identity, and failures raised by a [`Matcher`](crate::matcher::Matcher).
//!
//! # Examples
//!
//! ```
//! use fuzzyrank::error::{FuzzyRankError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(FuzzyRankError::configuration("no searchable fields"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for fuzzyrank operations.
#[derive(Error, Debug)]
pub enum FuzzyRankError {
    /// The search configuration cannot be used (no fields, malformed weights, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record has no usable value in the identity field.
    #[error("Record at position {position} has no usable identity field '{field}'")]
    MissingIdentity {
        /// Name of the identity field that was looked up.
        field: String,
        /// Position of the offending record in the input collection.
        position: usize,
    },

    /// Failure reported by the matching capability.
    #[error("Matcher error: {0}")]
    Matcher(String),

    /// I/O errors (reading record files from the CLI)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors from matchers built on `anyhow`
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with FuzzyRankError.
pub type Result<T> = std::result::Result<T, FuzzyRankError>;

impl FuzzyRankError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        FuzzyRankError::Configuration(msg.into())
    }

    /// Create a new missing identity error.
    pub fn missing_identity<S: Into<String>>(field: S, position: usize) -> Self {
        FuzzyRankError::MissingIdentity {
            field: field.into(),
            position,
        }
    }

    /// Create a new matcher error.
    pub fn matcher<S: Into<String>>(msg: S) -> Self {
        FuzzyRankError::Matcher(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        FuzzyRankError::Other(format!("Invalid argument: {}", msg.into()))
    }
}
