//! Wallet-adapter contract
//!
//! Wallet extensions are external collaborators: this crate only consumes
//! the uniform capability shape below. Each wallet reports rejections with
//! its own wording; [`WalletError::from_adapter_message`] is the single
//! place that wording is mapped to a common "user rejected" signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Supported wallet families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    Xaman,
    Crossmark,
    Gem,
    Ledger,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalletKind::Xaman => "xaman",
            WalletKind::Crossmark => "crossmark",
            WalletKind::Gem => "gem",
            WalletKind::Ledger => "ledger",
        };
        f.write_str(name)
    }
}

/// Result of asking the wallet to connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    pub approved: bool,
    pub account: Option<String>,
}

/// Result of asking the wallet to sign
///
/// Wallets that submit themselves return only `hash`; others return the
/// signed blob for us to submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub hash: Option<String>,
    pub tx_blob: Option<String>,
}

/// Wallet failures, normalized across wallet kinds
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("User rejected the request in {wallet}")]
    UserRejected { wallet: WalletKind },

    #[error("Wallet {wallet} is not available")]
    Unavailable { wallet: WalletKind },

    #[error("Wallet {wallet} failed: {message}")]
    Failed { wallet: WalletKind, message: String },
}

/// Substrings wallets use to report that the user declined
const REJECTION_MARKERS: [&str; 5] = ["rejected", "user refused", "declined", "cancel", "denied"];

impl WalletError {
    /// Normalize a wallet-specific error message
    pub fn from_adapter_message(wallet: WalletKind, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if REJECTION_MARKERS.iter().any(|marker| lower.contains(marker)) {
            WalletError::UserRejected { wallet }
        } else if lower.contains("not installed") || lower.contains("not available") {
            WalletError::Unavailable { wallet }
        } else {
            WalletError::Failed {
                wallet,
                message: message.to_string(),
            }
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::UserRejected { .. })
    }
}

/// Uniform capability contract every wallet adapter implements
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn kind(&self) -> WalletKind;

    async fn connect(&self) -> Result<WalletConnection, WalletError>;

    /// Sign (and possibly submit) an unsigned transaction JSON
    async fn sign_transaction(&self, tx: Value) -> Result<SignedTransaction, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;
}
