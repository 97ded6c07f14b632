//! # Ledger Access Configuration
//!
//! Centralized configuration and defaults for the ledger access services,
//! so connection, queue, cache and enrichment tunables live in one place.
//!
//! ## Features
//!
//! - **Ledger Protocol Constants**: page limits and upstream error codes
//! - **Defaults**: timeouts, backoff, TTLs, batch sizes
//! - **Service Configuration**: TOML files with environment overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_config::{load_config, protocol};
//!
//! let config = load_config(None, Some("production"))?;
//! let page_limit = config.scanner.page_limit.min(protocol::MAX_PAGE_LIMIT);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod protocol;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{
    load_config, CacheSettings, ConnectionSettings, EnrichmentSettings, LoggingSettings,
    MetadataSettings, NetworkSettings, PricingSettings, QueueSettings, ScannerSettings,
    ServiceConfig, TransactionSettings,
};
