//! Batched enrichment with partial-failure tolerance
//!
//! Items are enriched in fixed-size batches. Every item of a batch runs
//! concurrently and the batch completes before the next one starts, which
//! bounds the number of outbound calls in flight. An item that fails or
//! exceeds its time budget is logged and left out of the output.

use futures::future::join_all;
use ledger_adapter::LedgerClient;
use ledger_config::EnrichmentSettings;
use nft_metadata_adapter::NftMetadataSource;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use types::{NftEntry, NftKind, NormalizedNft};

use crate::error::{QueryError, Result};

/// Batch runner shared by the NFT and token listings
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentPipeline {
    batch_size: usize,
    item_timeout: Duration,
}

impl EnrichmentPipeline {
    pub fn new(batch_size: usize, item_timeout: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            item_timeout,
        }
    }

    pub fn from_settings(settings: &EnrichmentSettings) -> Self {
        Self::new(
            settings.batch_size,
            Duration::from_millis(settings.item_timeout_ms),
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Enrich `items` in order; the output never has more items than the input
    pub async fn run<I, O, F, Fut>(&self, items: Vec<I>, label: &str, enrich: F) -> Vec<O>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let total = items.len();
        let mut output = Vec::with_capacity(total);
        let mut dropped = 0usize;
        let mut pending = items.into_iter().enumerate().peekable();

        while pending.peek().is_some() {
            let batch: Vec<(usize, I)> = pending.by_ref().take(self.batch_size).collect();
            let outcomes = join_all(batch.into_iter().map(|(position, item)| {
                let work = enrich(item);
                async move {
                    let outcome = match timeout(self.item_timeout, work).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(QueryError::ItemTimeout {
                            item: format!("{} #{}", label, position),
                            timeout_ms: self.item_timeout.as_millis() as u64,
                        }),
                    };
                    (position, outcome)
                }
            }))
            .await;

            for (position, outcome) in outcomes {
                match outcome {
                    Ok(value) => output.push(value),
                    Err(e) => {
                        dropped += 1;
                        warn!("Dropping {} #{} from enrichment: {}", label, position, e);
                    }
                }
            }
        }

        debug!(
            "Enriched {}/{} {} items ({} dropped)",
            output.len(),
            total,
            label,
            dropped
        );
        output
    }
}

/// Joins an NFT's ledger entry with its metadata and open offers
#[derive(Clone)]
pub struct NftEnricher {
    metadata: Arc<dyn NftMetadataSource>,
}

impl NftEnricher {
    pub fn new(metadata: Arc<dyn NftMetadataSource>) -> Self {
        Self { metadata }
    }

    /// Metadata and both offer sides are fetched concurrently. Any failure
    /// fails the item, so a published NFT always carries all three.
    ///
    /// URI tokens have no offer objects; their sale terms come from the
    /// entry and they never carry buy offers.
    pub async fn enrich(&self, client: &LedgerClient, entry: NftEntry) -> Result<NormalizedNft> {
        if let NftKind::UriToken { sale } = &entry.kind {
            let sell_offers: Vec<_> = sale.iter().cloned().collect();
            let resolution = self.metadata.fetch(&entry).await?;
            return Ok(NormalizedNft::assemble(
                entry,
                resolution.record,
                resolution.resolved_uri,
                sell_offers,
                Vec::new(),
            ));
        }

        let offers = client.offers();
        let (resolution, sell_offers, buy_offers) = tokio::join!(
            self.metadata.fetch(&entry),
            offers.sell_offers(&entry.id),
            offers.buy_offers(&entry.id),
        );

        let resolution = resolution?;
        Ok(NormalizedNft::assemble(
            entry,
            resolution.record,
            resolution.resolved_uri,
            sell_offers?,
            buy_offers?,
        ))
    }
}
