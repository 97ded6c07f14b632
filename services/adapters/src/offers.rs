//! NFT offer lookups

use ledger_config::protocol::MIN_OFFER_PAGE_LIMIT;
use serde_json::json;
use types::{NftId, Offer, OfferSide};

use crate::scanner::{LedgerScanner, PagedQuery, ScanBounds};
use crate::{LedgerError, Result};

/// Offers per page requested from the node
const OFFER_PAGE_LIMIT: u32 = 100;

/// Reads sell and buy offers for individual NFTs
#[derive(Clone)]
pub struct OfferBook {
    scanner: LedgerScanner,
    max_pages: u32,
}

impl OfferBook {
    pub fn new(scanner: LedgerScanner, max_pages: u32) -> Self {
        Self { scanner, max_pages }
    }

    pub async fn sell_offers(&self, nft_id: &str) -> Result<Vec<Offer>> {
        self.offers(OfferSide::Sell, nft_id).await
    }

    pub async fn buy_offers(&self, nft_id: &str) -> Result<Vec<Offer>> {
        self.offers(OfferSide::Buy, nft_id).await
    }

    /// Offers on one side; an NFT with no offers yields an empty list
    pub async fn offers(&self, side: OfferSide, nft_id: &str) -> Result<Vec<Offer>> {
        NftId::parse(nft_id).map_err(|e| LedgerError::InvalidRequest(e.to_string()))?;

        let command = match side {
            OfferSide::Sell => "nft_sell_offers",
            OfferSide::Buy => "nft_buy_offers",
        };
        let query = PagedQuery::new(
            command,
            json!({
                "nft_id": nft_id,
                "limit": OFFER_PAGE_LIMIT.max(MIN_OFFER_PAGE_LIMIT),
            }),
            "offers",
        );
        let bounds = ScanBounds {
            limit: usize::MAX,
            max_pages: self.max_pages,
        };

        match self.scanner.paginate(&query, bounds).await {
            Ok(entries) => {
                let offers: Vec<Offer> = entries.iter().filter_map(Offer::from_rpc).collect();
                if offers.len() < entries.len() {
                    tracing::debug!(
                        "Skipped {} malformed {} entries for {}",
                        entries.len() - offers.len(),
                        command,
                        nft_id
                    );
                }
                Ok(offers)
            }
            // Nodes answer objectNotFound when an NFT has no offers
            Err(LedgerError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
