//! Metadata fetch failures
//!
//! None of these cross [`MetadataResolver::resolve`](crate::MetadataResolver::resolve);
//! each one makes the resolver fall through to its next source.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: String, status: u16 },

    #[error("{url} did not answer within {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Unusable body from {url}: {reason}")]
    InvalidBody { url: String, reason: String },

    #[error("Reference {reference:?} cannot be fetched")]
    Unsupported { reference: String },

    #[error("No source produced metadata for {reference:?}")]
    Exhausted { reference: String },
}

impl MetadataError {
    pub fn from_reqwest(url: &str, error: reqwest::Error, timeout_ms: u64) -> Self {
        if error.is_timeout() {
            MetadataError::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else {
            MetadataError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}
