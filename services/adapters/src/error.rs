//! Error types for the ledger adapter

use ledger_config::protocol::codes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::Network;

use crate::wallet::WalletError;

/// Result type alias for ledger adapter operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Structured error returned by an upstream node.
///
/// `code` is the node's machine-readable error token (`actNotFound`,
/// `slowDown`, ...); `message` is its human-readable text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: Option<String>,
    pub message: String,
}

impl RpcError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Error with no upstream code, e.g. a transport failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Read `{error, error_message}` or `{error: {message}}` from a response frame
    pub fn from_response(frame: &serde_json::Value) -> Self {
        let error = frame.get("error");
        let code = error.and_then(|e| e.as_str()).map(str::to_string);
        let message = frame
            .get("error_message")
            .and_then(|m| m.as_str())
            .or_else(|| error.and_then(|e| e.get("message")).and_then(|m| m.as_str()))
            .map(str::to_string)
            .or_else(|| code.clone())
            .unwrap_or_else(|| "unknown upstream error".to_string());
        let code = code.or_else(|| {
            error
                .and_then(|e| e.get("code"))
                .and_then(|c| c.as_str())
                .map(str::to_string)
        });
        Self { code, message }
    }

    fn code_is(&self, expected: &str) -> bool {
        self.code.as_deref() == Some(expected)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Main error type for ledger access operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Connection could not be (re-)established; fatal until a caller retries
    #[error("Connection failed for network {network}: {reason}")]
    ConnectionFailed {
        /// Network that failed to connect
        network: Network,
        /// Reason for the failure
        reason: String,
    },

    /// Connection attempt timed out
    #[error("Connection timeout for network {network} after {timeout_ms}ms")]
    ConnectionTimeout {
        network: Network,
        timeout_ms: u64,
    },

    /// Session went away while a request was in flight
    #[error("Not connected to network {network}")]
    NotConnected { network: Network },

    /// Upstream asked us to slow down
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(RpcError),

    /// Account or object does not exist
    #[error("Not found: {0}")]
    NotFound(RpcError),

    /// Any other upstream or transport failure, original cause preserved
    #[error("Network error: {0}")]
    Network(RpcError),

    /// A pagination marker no longer points into an available ledger
    #[error("Stale pagination marker")]
    StaleMarker,

    /// Object kind does not exist on this network
    #[error("Object type {object_type} unsupported on {network}")]
    UnsupportedObjectType {
        object_type: String,
        network: Network,
    },

    /// Submitted transaction did not validate within the wait window
    #[error("Transaction {hash} not validated after {waited_ms}ms")]
    ValidationTimeout { hash: String, waited_ms: u64 },

    /// Transaction rejected or failed; engine result preserved
    #[error("Transaction failed: {code}: {message}")]
    TransactionFailed { code: String, message: String },

    /// Request parameters rejected before reaching the network
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response lacked an expected field
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request did not complete in time
    #[error("Request {command} timed out after {timeout_ms}ms")]
    RequestTimeout { command: String, timeout_ms: u64 },

    /// Request queue shut down before the request ran
    #[error("Request queue closed")]
    QueueClosed,

    /// Caller cancelled a long-running wait
    #[error("Operation cancelled")]
    Cancelled,

    /// Wallet adapter failure
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// JSON encode/decode failure
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl LedgerError {
    /// Classify an upstream error into a typed outcome.
    ///
    /// The original error is kept inside every variant.
    pub fn classify(error: RpcError) -> Self {
        if error.code_is(codes::ACCOUNT_NOT_FOUND)
            || error.code_is(codes::OBJECT_NOT_FOUND)
            || error.code_is(codes::OBJ_NOT_FOUND)
            || error.code_is(codes::TXN_NOT_FOUND)
        {
            return LedgerError::NotFound(error);
        }
        if error.code_is(codes::SLOW_DOWN) {
            return LedgerError::RateLimitExceeded(error);
        }
        if error.code.is_none() {
            // Some proxies drop the token and only forward text
            let lower = error.message.to_ascii_lowercase();
            if lower.contains("account not found") || lower.contains("object not found") {
                return LedgerError::NotFound(error);
            }
            if lower.contains("slow down") {
                return LedgerError::RateLimitExceeded(error);
            }
        }
        LedgerError::Network(error)
    }

    /// Whether the error means a pagination marker went stale
    pub fn is_stale_marker(&self) -> bool {
        match self {
            LedgerError::StaleMarker => true,
            LedgerError::Network(error) => {
                error.code_is(codes::LEDGER_NOT_FOUND)
                    || (error.code_is(codes::INVALID_PARAMS)
                        && error.message.to_ascii_lowercase().contains("marker"))
            }
            _ => false,
        }
    }

    /// Whether the node rejected the object type filter
    pub fn is_unsupported_type(&self) -> bool {
        match self {
            LedgerError::UnsupportedObjectType { .. } => true,
            LedgerError::Network(error) => {
                let lower = error.message.to_ascii_lowercase();
                (error.code_is(codes::INVALID_PARAMS) && lower.contains("type"))
                    || error.code_is("unknownType")
            }
            _ => false,
        }
    }

    /// Check if this error is recoverable through a caller retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConnectionFailed { .. }
                | LedgerError::ConnectionTimeout { .. }
                | LedgerError::NotConnected { .. }
                | LedgerError::RateLimitExceeded(_)
                | LedgerError::Network(_)
                | LedgerError::RequestTimeout { .. }
                | LedgerError::WebSocket(_)
        )
    }

    /// Stable machine-readable code for public error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::ConnectionFailed { .. } | LedgerError::ConnectionTimeout { .. } => {
                "CONNECTION_FAILED"
            }
            LedgerError::NotConnected { .. } => "NOT_CONNECTED",
            LedgerError::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::Network(_) | LedgerError::WebSocket(_) => "NETWORK_ERROR",
            LedgerError::StaleMarker => "STALE_MARKER",
            LedgerError::UnsupportedObjectType { .. } => "UNSUPPORTED_OBJECT_TYPE",
            LedgerError::ValidationTimeout { .. } => "VALIDATION_TIMEOUT",
            LedgerError::TransactionFailed { .. } => "TRANSACTION_FAILED",
            LedgerError::InvalidRequest(_) => "INVALID_REQUEST",
            LedgerError::InvalidResponse(_) | LedgerError::JsonParse(_) => "INVALID_RESPONSE",
            LedgerError::RequestTimeout { .. } => "TIMEOUT",
            LedgerError::QueueClosed => "QUEUE_CLOSED",
            LedgerError::Cancelled => "CANCELLED",
            LedgerError::Wallet(WalletError::UserRejected { .. }) => "USER_REJECTED",
            LedgerError::Wallet(_) => "WALLET_ERROR",
        }
    }
}
