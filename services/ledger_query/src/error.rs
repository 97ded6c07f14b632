//! Error types for the query layer

use ledger_adapter::LedgerError;
use thiserror::Error;
use types::{ApiResponse, Network};

/// Result type alias for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Ledger access failed; carries the classified upstream cause
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Caller input rejected before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network is switched off in configuration
    #[error("Network {0} is disabled")]
    NetworkDisabled(Network),

    /// Pricing service unusable; callers fall back to the order book
    #[error("Pricing service {url} failed: {reason}")]
    Pricing { url: String, reason: String },

    /// No usable price from any source
    #[error("No price available for {currency}.{issuer}")]
    PriceUnavailable { currency: String, issuer: String },

    /// One item took longer than the enrichment budget
    #[error("Enriching {item} exceeded {timeout_ms}ms")]
    ItemTimeout { item: String, timeout_ms: u64 },

    /// Metadata source refused an item
    #[error("Metadata unavailable: {0}")]
    Metadata(#[from] nft_metadata_adapter::MetadataError),
}

impl QueryError {
    /// Stable machine-readable code for public error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Ledger(e) => e.code(),
            QueryError::InvalidRequest(_) => "INVALID_REQUEST",
            QueryError::NetworkDisabled(_) => "NETWORK_DISABLED",
            QueryError::Pricing { .. } | QueryError::PriceUnavailable { .. } => "PRICING_UNAVAILABLE",
            QueryError::ItemTimeout { .. } => "TIMEOUT",
            QueryError::Metadata(_) => "METADATA_FETCH_FAILURE",
        }
    }

    /// Wrap into the public `{success: false, error}` envelope
    pub fn into_response<T>(self) -> ApiResponse<T> {
        ApiResponse::err(self.code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_adapter::RpcError;

    #[test]
    fn test_ledger_codes_pass_through() {
        let error: QueryError = LedgerError::classify(RpcError::new("slowDown", "Slow down")).into();
        assert_eq!(error.code(), "RATE_LIMIT_EXCEEDED");

        let response: ApiResponse<()> = error.into_response();
        assert!(!response.success);
        assert!(response.error.unwrap().message.contains("Slow down"));
    }

    #[test]
    fn test_request_codes() {
        assert_eq!(QueryError::InvalidRequest("x".into()).code(), "INVALID_REQUEST");
        assert_eq!(QueryError::NetworkDisabled(Network::Xahau).code(), "NETWORK_DISABLED");
    }
}
