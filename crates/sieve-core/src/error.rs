//! Error types for sieve.

use thiserror::Error;

/// Result type alias for sieve operations.
pub type Result<T> = std::result::Result<T, SieveError>;

/// Errors raised by the deduplication core.
///
/// Only configuration violations and ambiguous input (a repeated document
/// id) are fatal. Data-level anomalies such as empty text never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SieveError {
    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two signatures (or a signature and an index) disagree on length
    #[error("Signature length mismatch: expected {expected} permutations, found {found}")]
    SignatureMismatch { expected: usize, found: usize },

    /// Two documents in one batch share an id
    #[error("Duplicate document id: {0}")]
    DuplicateId(u64),

    /// A fingerprint string could not be parsed
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}

impl SieveError {
    /// Shorthand for a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
