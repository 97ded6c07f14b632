//! Public query functions
//!
//! Each entry point validates its input, goes through the cache where the
//! result is shareable, and always answers with an [`ApiResponse`]
//! envelope. No error crosses this boundary.

use ledger_adapter::{LedgerClient, LedgerClients, ScanBounds, WalletAdapter};
use ledger_config::ServiceConfig;
use nft_metadata_adapter::{MetadataConfig, MetadataResolver, NftMetadataSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use types::{
    currency_display_name, AcceptOfferRequest, AcceptResponse, AcceptResult, ApiResponse, LedgerObjectType,
    Network, NftEntry, NftOffers, NftResponse, NormalizedNft, NormalizedToken, OffersRequest,
    OffersResponse, TokenResponse,
};

use crate::cache::{cache_key, QueryCache};
use crate::enrichment::{EnrichmentPipeline, NftEnricher};
use crate::error::{QueryError, Result};
use crate::pricing::PricingClient;
use crate::tokens::{aggregate_trust_lines, issuer_domain, merge_with_seeds, TokenCandidate};

const NFTS_OPERATION: &str = "nfts";
const TOKENS_OPERATION: &str = "tokens";

/// Query façade over the ledger clients, metadata resolver and cache
pub struct LedgerQueryService {
    config: Arc<ServiceConfig>,
    clients: Arc<LedgerClients>,
    cache: Arc<QueryCache>,
    nfts: NftEnricher,
    pricing: Arc<PricingClient>,
    pipeline: EnrichmentPipeline,
}

impl LedgerQueryService {
    /// Production wiring: WebSocket sessions, HTTP metadata resolver and a
    /// durable cache when configured
    pub fn new(config: Arc<ServiceConfig>) -> anyhow::Result<Self> {
        let clients = Arc::new(LedgerClients::new(config.clone()));
        let metadata = Arc::new(MetadataResolver::new(MetadataConfig::from_settings(
            &config.metadata,
            &config.cache,
        ))?);
        let cache = if config.cache.durable {
            QueryCache::durable(&config.cache.cache_dir)?
        } else {
            QueryCache::in_memory()
        };
        Self::with_components(config, clients, metadata, Arc::new(cache))
    }

    /// Wiring with injected collaborators
    pub fn with_components(
        config: Arc<ServiceConfig>,
        clients: Arc<LedgerClients>,
        metadata: Arc<dyn NftMetadataSource>,
        cache: Arc<QueryCache>,
    ) -> anyhow::Result<Self> {
        let pricing = Arc::new(PricingClient::new(&config.pricing)?);
        let pipeline = EnrichmentPipeline::from_settings(&config.enrichment);

        info!(
            "Ledger query service ready (batch size {}, token TTL {}s, NFT TTL {}s)",
            pipeline.batch_size(),
            config.cache.token_ttl_secs,
            config.cache.nft_ttl_secs
        );

        Ok(Self {
            config,
            clients,
            cache,
            nfts: NftEnricher::new(metadata),
            pricing,
            pipeline,
        })
    }

    pub fn clients(&self) -> &Arc<LedgerClients> {
        &self.clients
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Most-held issued tokens on `network`
    pub async fn load_tokens(&self, network: &str, limit: usize) -> TokenResponse {
        respond("load_tokens", self.try_load_tokens(network, limit).await)
    }

    /// NFTs on `network`, enriched with metadata and open offers
    pub async fn load_nfts(&self, network: &str, limit: usize) -> NftResponse {
        respond("load_nfts", self.try_load_nfts(network, limit).await)
    }

    /// Sell and buy offers for one NFT; never cached
    pub async fn fetch_nft_offers(&self, request: &OffersRequest) -> OffersResponse {
        respond("fetch_nft_offers", self.try_fetch_nft_offers(request).await)
    }

    /// Accept an offer with the caller's wallet and wait for validation
    pub async fn accept_nft_offer(
        &self,
        request: &AcceptOfferRequest,
        wallet: &dyn WalletAdapter,
    ) -> AcceptResponse {
        respond("accept_nft_offer", self.try_accept_nft_offer(request, wallet).await)
    }

    async fn try_load_tokens(&self, network: &str, limit: usize) -> Result<Arc<Vec<NormalizedToken>>> {
        let network = self.network(network)?;
        let limit = positive_limit(limit)?;
        let key = cache_key(TOKENS_OPERATION, &self.config.cache.key_version, network, limit);
        let ttl = Duration::from_secs(self.config.cache.token_ttl_secs);
        self.cache
            .get_or_compute(&key, ttl, || self.compute_tokens(network, limit))
            .await
    }

    async fn try_load_nfts(&self, network: &str, limit: usize) -> Result<Arc<Vec<NormalizedNft>>> {
        let network = self.network(network)?;
        let limit = positive_limit(limit)?;
        let key = cache_key(NFTS_OPERATION, &self.config.cache.key_version, network, limit);
        let ttl = Duration::from_secs(self.config.cache.nft_ttl_secs);
        self.cache
            .get_or_compute(&key, ttl, || self.compute_nfts(network, limit))
            .await
    }

    async fn try_fetch_nft_offers(&self, request: &OffersRequest) -> Result<NftOffers> {
        let network = self.network(&request.network)?;
        let client = self.clients.get(network);
        let offers = client.offers();

        let (sell, buy) = tokio::try_join!(
            offers.sell_offers(&request.nft_id),
            offers.buy_offers(&request.nft_id),
        )?;

        let (sell_offers, buy_offers) = if request.include_expired {
            (sell, buy)
        } else {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            (
                sell.into_iter().filter(|o| !o.is_expired_at(now)).collect(),
                buy.into_iter().filter(|o| !o.is_expired_at(now)).collect(),
            )
        };

        Ok(NftOffers {
            nft_id: request.nft_id.to_ascii_uppercase(),
            sell_offers,
            buy_offers,
        })
    }

    async fn try_accept_nft_offer(
        &self,
        request: &AcceptOfferRequest,
        wallet: &dyn WalletAdapter,
    ) -> Result<AcceptResult> {
        let network = self.network(&request.network)?;
        let client = self.clients.get(network);
        let result = client
            .transactions()
            .accept_nft_offer(wallet, &request.account, &request.offer_id, request.side)
            .await?;

        // Ownership changed; cached listings for this network are stale
        let prefix = format!(
            "{}_{}:{}:",
            NFTS_OPERATION,
            self.config.cache.key_version,
            network.as_str()
        );
        let dropped = self.cache.invalidate_prefix(&prefix);
        if dropped > 0 {
            info!("Invalidated {} cached NFT listings on {}", dropped, network);
        }
        Ok(result)
    }

    fn network(&self, name: &str) -> Result<Network> {
        let network: Network = name
            .parse()
            .map_err(|e: types::TypeError| QueryError::InvalidRequest(e.to_string()))?;
        if !self.config.is_enabled(network) {
            return Err(QueryError::NetworkDisabled(network));
        }
        Ok(network)
    }

    async fn compute_nfts(&self, network: Network, limit: usize) -> Result<Vec<NormalizedNft>> {
        let client = self.clients.get(network);
        let entries = scan_nft_entries(&client, &self.config, limit).await?;

        let enricher = &self.nfts;
        let client = &client;
        let nfts = self
            .pipeline
            .run(entries, "nft", |entry| enricher.enrich(client, entry))
            .await;

        info!("Loaded {} NFTs on {}", nfts.len(), network);
        Ok(nfts)
    }

    async fn compute_tokens(&self, network: Network, limit: usize) -> Result<Vec<NormalizedToken>> {
        let client = self.clients.get(network);
        let scan_limit = self.config.scanner.page_limit as usize * self.config.scanner.max_pages as usize;
        let lines = client
            .scanner()
            .scan(
                LedgerObjectType::State,
                ScanBounds {
                    limit: scan_limit.max(1),
                    max_pages: self.config.scanner.max_pages,
                },
            )
            .await?;

        let candidates = merge_with_seeds(network, aggregate_trust_lines(&lines), limit);

        let client = &client;
        let pricing = &self.pricing;
        let tokens = self
            .pipeline
            .run(candidates, "token", |candidate| {
                enrich_token(client, pricing, candidate)
            })
            .await;

        info!("Loaded {} tokens on {} from {} trust lines", tokens.len(), network, lines.len());
        Ok(tokens)
    }
}

/// Flattened NFT entries for the listing
async fn scan_nft_entries(
    client: &LedgerClient,
    config: &ServiceConfig,
    limit: usize,
) -> Result<Vec<NftEntry>> {
    let network = client.network();
    let bounds = ScanBounds {
        limit,
        max_pages: config.scanner.max_pages,
    };

    let mut entries: Vec<NftEntry> = if network.supports_uri_tokens() {
        client
            .scanner()
            .scan(LedgerObjectType::UriToken, bounds)
            .await?
            .iter()
            .filter_map(NftEntry::from_uri_token)
            .collect()
    } else {
        client
            .scanner()
            .scan(LedgerObjectType::NftPage, bounds)
            .await?
            .iter()
            .flat_map(NftEntry::from_nft_page)
            .collect()
    };

    // One page object can hold many NFTs
    entries.truncate(limit);
    Ok(entries)
}

async fn enrich_token(
    client: &LedgerClient,
    pricing: &PricingClient,
    candidate: TokenCandidate,
) -> Result<NormalizedToken> {
    let (domain, quote) = tokio::join!(
        issuer_domain(client, &candidate.key.issuer),
        pricing.quote(client, &candidate.key),
    );
    let domain = domain?;
    let quote = quote.unwrap_or_else(|e| {
        warn!("No price for {}.{}: {}", candidate.key.currency, candidate.key.issuer, e);
        Default::default()
    });

    let display_name = candidate
        .name
        .unwrap_or_else(|| currency_display_name(&candidate.key.currency));

    Ok(NormalizedToken {
        currency: candidate.key.currency,
        issuer: candidate.key.issuer,
        display_name,
        domain,
        total_supply: candidate.aggregate.supply.normalize().to_string(),
        holders: candidate.aggregate.holders,
        trustlines: candidate.aggregate.trustlines,
        price_usd: quote.price_usd,
        price_native: quote.price_native,
        change_24h: quote.change_24h,
        sparkline: quote.sparkline,
    })
}

fn positive_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(QueryError::InvalidRequest("limit must be at least 1".to_string()));
    }
    Ok(limit)
}

fn respond<T>(operation: &str, outcome: Result<T>) -> ApiResponse<T> {
    match outcome {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            warn!("{} failed: {}", operation, e);
            e.into_response()
        }
    }
}
