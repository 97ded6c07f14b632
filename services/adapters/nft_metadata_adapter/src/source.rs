//! Metadata source seam used by enrichment

use async_trait::async_trait;
use types::NftEntry;

use crate::error::Result;
use crate::resolver::{MetadataResolver, Resolution};

/// Anything that can describe an NFT from its ledger entry.
///
/// An `Err` means the item cannot be enriched at all; callers drop it.
#[async_trait]
pub trait NftMetadataSource: Send + Sync {
    async fn fetch(&self, entry: &NftEntry) -> Result<Resolution>;
}

#[async_trait]
impl NftMetadataSource for MetadataResolver {
    /// Never fails: unresolved references come back with blank fields
    async fn fetch(&self, entry: &NftEntry) -> Result<Resolution> {
        let uri = entry.uri.as_deref().unwrap_or_default();
        Ok(self.resolve_detailed(uri, Some(&entry.id)).await)
    }
}
