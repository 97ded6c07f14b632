//! # Ledger Types
//!
//! Shared data model for the ledger access layer: which network a call
//! targets, what a page of ledger state looks like, and the normalized
//! NFT/token records handed back to callers.
//!
//! ## Design Philosophy
//!
//! - **Opaque markers**: pagination markers are carried as raw JSON and
//!   round-tripped unmodified
//! - **Immutable results**: normalized records are built once by the
//!   enrichment pipeline and never partially published
//! - **String amounts**: ledger values stay as strings so no precision is
//!   lost between the wire and the caller
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Network, NftId};
//!
//! let network: Network = "xrpl".parse().unwrap();
//! assert!(!network.supports_uri_tokens());
//!
//! let id = NftId::parse(
//!     "000800006203F49C21D5D6E022CB16DE3538F248662FC73C29ABA6A90000000D",
//! ).unwrap();
//! assert_eq!(id.serial, 13);
//! ```

pub mod account;
pub mod amount;
pub mod api;
pub mod error;
pub mod ledger;
pub mod network;
pub mod nft;
pub mod token;

pub use account::{encode_account_id, AccountId};
pub use amount::{Amount, Offer};
pub use api::{
    AcceptOfferRequest, AcceptResponse, AcceptResult, ApiError, ApiResponse, NftResponse,
    OfferSide, OffersRequest, OffersResponse, NftOffers, TokenResponse,
};
pub use error::TypeError;
pub use ledger::{LedgerObjectType, LedgerPage, RawEntry, RpcRequest};
pub use network::Network;
pub use nft::{decode_hex_uri, MetadataRecord, NftEntry, NftId, NftKind, NormalizedNft};
pub use token::{currency_display_name, NormalizedToken, TokenKey};
