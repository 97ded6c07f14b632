//! Shared fixtures for the query service tests
#![allow(dead_code)]

use async_trait::async_trait;
use ledger_adapter::testing::{MockConnector, MockLedger};
use ledger_adapter::LedgerClients;
use ledger_config::ServiceConfig;
use ledger_query::{LedgerQueryService, QueryCache};
use nft_metadata_adapter::{MetadataError, MetadataOrigin, NftMetadataSource, Resolution};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use types::{MetadataRecord, NftEntry};

/// Issuer account id as hex, shared by every fixture NFT
pub const ISSUER_HEX: &str = "0A1B2C3D4E5F60718293A4B5C6D7E8F901234567";

/// Owner account id as hex
pub const OWNER_HEX: &str = "89ABCDEF0123456789ABCDEF0123456789ABCDEF";

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.queue.min_interval_ms = 1;
    config.scanner.max_pages = 10;
    config.enrichment.batch_size = 10;
    config.enrichment.item_timeout_ms = 5_000;
    config.transactions.poll_interval_ms = 100;
    config.transactions.validation_timeout_ms = 5_000;
    config.pricing.requests_per_second = 1_000;
    config
}

/// 64-hex NFT id with the given serial
pub fn nft_id(serial: u32) -> String {
    format!("00080000{}{:08X}{:08X}", ISSUER_HEX, 0x29ABA6A9u32, serial)
}

/// One `NFTokenPage` holding a single NFT
pub fn nft_page(serial: u32) -> Value {
    json!({
        "LedgerEntryType": "NFTokenPage",
        "index": format!("{}{:024X}", OWNER_HEX, serial),
        "NFTokens": [{
            "NFToken": {
                "NFTokenID": nft_id(serial),
                "URI": format!("ipfs://QmFixture/{}.json", serial),
            }
        }]
    })
}

/// Serve `ledger_data` from fixed pages chained by `m1`, `m2`, ... markers
pub fn paged_state(pages: &[Vec<Value>], params: &Value) -> Value {
    let index = match params.get("marker").and_then(Value::as_str) {
        Some(marker) => marker
            .trim_start_matches('m')
            .parse::<usize>()
            .unwrap_or(pages.len()),
        None => 0,
    };
    let mut result = json!({ "state": pages.get(index).cloned().unwrap_or_default() });
    if index + 1 < pages.len() {
        result["marker"] = json!(format!("m{}", index + 1));
    }
    result
}

/// Metadata source that answers from the entry itself
#[derive(Default)]
pub struct StubMetadata {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl StubMetadata {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail for the given NFT ids
    pub fn failing(ids: impl IntoIterator<Item = String>) -> Arc<Self> {
        Arc::new(Self {
            failing: ids.into_iter().collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NftMetadataSource for StubMetadata {
    async fn fetch(&self, entry: &NftEntry) -> nft_metadata_adapter::Result<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&entry.id) {
            return Err(MetadataError::Exhausted {
                reference: entry.uri.clone().unwrap_or_default(),
            });
        }
        Ok(Resolution {
            record: MetadataRecord {
                image: format!("https://img.test/{}.png", entry.serial),
                name: format!("Fixture #{}", entry.serial),
                description: String::new(),
                collection: "Fixtures".to_string(),
            },
            resolved_uri: format!("https://meta.test/{}.json", entry.serial),
            origin: MetadataOrigin::Service,
        })
    }
}

pub fn service_with(
    config: ServiceConfig,
    ledger: Arc<MockLedger>,
    metadata: Arc<dyn NftMetadataSource>,
    cache: Arc<QueryCache>,
) -> LedgerQueryService {
    let config = Arc::new(config);
    let clients = Arc::new(LedgerClients::with_connector(
        config.clone(),
        Arc::new(MockConnector::new(ledger)),
    ));
    LedgerQueryService::with_components(config, clients, metadata, cache).unwrap()
}

pub fn service(ledger: Arc<MockLedger>, metadata: Arc<dyn NftMetadataSource>) -> LedgerQueryService {
    service_with(test_config(), ledger, metadata, Arc::new(QueryCache::in_memory()))
}

/// One Xahau `URIToken` object; `price` lists it for sale in drops
pub fn uri_token(n: u32, price: Option<&str>) -> Value {
    let mut object = json!({
        "LedgerEntryType": "URIToken",
        "index": format!("{:064X}", n),
        "Issuer": "rIssuerOfUriTokens",
        "Owner": "rOwnerOfUriTokens",
        "URI": format!("ipfs://QmUriFixture/{}.json", n),
    });
    if let Some(price) = price {
        object["Amount"] = json!(price);
    }
    object
}
