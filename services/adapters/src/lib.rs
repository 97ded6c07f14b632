//! # Ledger Adapter - Connection-Managed RPC Access
//!
//! ## Purpose
//!
//! Turns a slow, occasionally unavailable ledger node into a stable,
//! bounded-latency source of reads. Everything that talks to a node goes
//! through the same three layers:
//!
//! - **Connection Manager** ([`input::ConnectionManager`]): at most one live
//!   session per network, lazy connect, reconnect with capped exponential
//!   backoff, gives up after a bounded number of consecutive failures
//! - **Request Queue** ([`queue::RequestQueue`]): FIFO dispatch spaced at a
//!   minimum interval, upstream errors classified into [`LedgerError`]
//! - **Ledger Scanner** ([`scanner::LedgerScanner`]): marker pagination
//!   bounded by a page budget, stale markers end the scan with partial data
//!
//! On top of these sit offer lookups ([`offers::OfferBook`]) and transaction
//! submission/monitoring ([`transaction::TransactionMonitor`]). Signing is
//! delegated to an injected [`wallet::WalletAdapter`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_adapter::{LedgerClients, ScanBounds};
//! use std::sync::Arc;
//! use types::{LedgerObjectType, Network};
//!
//! # async fn example() -> ledger_adapter::Result<()> {
//! let config = Arc::new(ledger_config::ServiceConfig::default());
//! let clients = LedgerClients::new(config);
//! let xrpl = clients.get(Network::Xrpl);
//! let pages = xrpl
//!     .scanner()
//!     .scan(LedgerObjectType::NftPage, ScanBounds { limit: 50, max_pages: 10 })
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod input;
pub mod offers;
pub mod queue;
pub mod rate_limit;
pub mod scanner;
pub mod transaction;
pub mod wallet;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{LedgerClient, LedgerClients};
pub use error::{LedgerError, Result, RpcError};
pub use input::{
    ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStatus, DropSignal,
    LedgerSession, SessionConnector, WebSocketConnector,
};
pub use offers::OfferBook;
pub use queue::{QueueStats, RequestQueue};
pub use rate_limit::{ExternalService, ServiceRateLimiter};
pub use scanner::{LedgerScanner, PagedQuery, ScanBounds};
pub use transaction::{SubmitOutcome, TransactionMonitor};
pub use wallet::{SignedTransaction, WalletAdapter, WalletConnection, WalletError, WalletKind};
