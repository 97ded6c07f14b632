//! Error types for parsing ledger identifiers

use thiserror::Error;

/// Errors raised while decoding ledger identifiers and names
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Network name not recognised
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Identifier had the wrong length
    #[error("Invalid length for {kind}: expected {expected} hex chars, got {actual}")]
    InvalidLength {
        /// What was being decoded
        kind: &'static str,
        /// Expected number of hex characters
        expected: usize,
        /// Number of characters received
        actual: usize,
    },

    /// Identifier was not valid hex
    #[error("Invalid hex in {kind}: {value}")]
    InvalidHex {
        /// What was being decoded
        kind: &'static str,
        /// Offending value
        value: String,
    },
}
