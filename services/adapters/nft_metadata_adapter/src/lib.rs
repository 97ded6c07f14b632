//! NFT Metadata Adapter
//!
//! Turns the URI stored on an NFT into a displayable record (name, image,
//! description, collection). Resolution never fails: every source that
//! errors or times out falls through to the next, and an NFT nothing can
//! describe comes back with blank fields.
//!
//! Features:
//! - Fixed-precedence source chain (per-item service, CDN mirror, gateways)
//! - Content-address rewriting across sibling gateway mirrors
//! - Field normalization across common metadata layouts
//! - TTL record cache with optional disk persistence

pub mod cache;
pub mod config;
pub mod error;
pub mod normalize;
pub mod resolver;
pub mod source;
pub mod uri;

pub use cache::{CachedMetadata, MetadataCache};
pub use config::MetadataConfig;
pub use error::{MetadataError, Result};
pub use normalize::normalize_metadata;
pub use resolver::{MetadataOrigin, MetadataResolver, Metrics, Resolution};
pub use source::NftMetadataSource;
