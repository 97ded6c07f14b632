//! # Ledger Query - Cached Token and NFT Listings
//!
//! ## Purpose
//!
//! The public face of the ledger access layer. Callers ask for the top
//! tokens or NFTs of a network, the offers on one NFT, or to accept an
//! offer; every answer comes back as an [`types::ApiResponse`] envelope.
//!
//! - **Query cache** ([`cache::QueryCache`]): compute-if-absent with a TTL,
//!   shared `Arc` payloads, optional on-disk tier
//! - **Enrichment** ([`enrichment::EnrichmentPipeline`]): bounded batches,
//!   per-item time budget, failed items dropped instead of failing the list
//! - **Tokens** ([`tokens`]): trust-line aggregation merged with well-known
//!   tokens, prices from [`pricing::PricingClient`] with an order-book
//!   fallback
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledger_query::LedgerQueryService;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Arc::new(ledger_config::ServiceConfig::default());
//! let service = LedgerQueryService::new(config)?;
//! let nfts = service.load_nfts("xrpl", 50).await;
//! assert!(nfts.success || nfts.error.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod cache;
pub mod enrichment;
pub mod error;
pub mod pricing;
pub mod service;
pub mod tokens;

pub use cache::{cache_key, CacheMetrics, QueryCache};
pub use enrichment::{EnrichmentPipeline, NftEnricher};
pub use error::{QueryError, Result};
pub use pricing::{book_mid_price, PriceQuote, PricingClient};
pub use service::LedgerQueryService;
pub use tokens::{
    aggregate_trust_lines, issuer_domain, merge_with_seeds, seed_tokens, SeedToken,
    TokenAggregate, TokenCandidate,
};
