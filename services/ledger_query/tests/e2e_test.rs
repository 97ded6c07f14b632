//! End-to-end NFT listing against a scripted ledger
//!
//! Runs on a paused clock so queue spacing elapses instantly.

mod common;

use common::{nft_page, paged_state, service, uri_token, StubMetadata};
use ledger_adapter::testing::MockLedger;
use ledger_adapter::RpcError;
use serde_json::Value;
use types::Amount;
use std::sync::Arc;

fn three_pages() -> Vec<Vec<Value>> {
    (0..3)
        .map(|page| (0..20).map(|i| nft_page(page * 20 + i + 1)).collect())
        .collect()
}

fn listing_ledger() -> Arc<MockLedger> {
    let pages = three_pages();
    MockLedger::new(move |request| match request.command.as_str() {
        "ledger_data" => Ok(paged_state(&pages, &request.params)),
        "nft_sell_offers" | "nft_buy_offers" => {
            Err(RpcError::new("objectNotFound", "The requested object was not found."))
        }
        other => Err(RpcError::new("unknownCmd", format!("unexpected {}", other))),
    })
}

#[tokio::test(start_paused = true)]
async fn test_load_nfts_end_to_end() {
    println!("🧪 Loading 50 NFTs across three ledger pages");

    let ledger = listing_ledger();
    let metadata = StubMetadata::new();
    let service = service(ledger.clone(), metadata.clone());

    let response = service.load_nfts("xrpl", 50).await;
    assert!(response.success, "unexpected error: {:?}", response.error);
    assert!(response.error.is_none());

    let nfts = response.data.unwrap();
    assert_eq!(nfts.len(), 50);
    for nft in nfts.iter() {
        assert_eq!(nft.id.len(), 64);
        assert!(nft.issuer.starts_with('r'));
        assert!(nft.owner.starts_with('r'));
        assert!(nft.sell_offers.is_empty());
        assert!(nft.buy_offers.is_empty());
    }
    assert_eq!(nfts[0].serial, 1);
    assert_eq!(nfts[0].name, "Fixture #1");
    assert_eq!(nfts[0].uri, "ipfs://QmFixture/1.json");
    assert_eq!(nfts[49].serial, 50);

    // Two full pages plus part of the third
    assert_eq!(ledger.count("ledger_data"), 3);
    assert_eq!(ledger.count("nft_sell_offers"), 50);
    assert_eq!(ledger.count("nft_buy_offers"), 50);
    assert_eq!(metadata.calls(), 50);

    println!("✅ {} NFTs enriched", nfts.len());
}

#[tokio::test(start_paused = true)]
async fn test_second_call_served_from_cache() {
    let ledger = listing_ledger();
    let service = service(ledger.clone(), StubMetadata::new());

    let first = service.load_nfts("xrpl", 50).await.data.unwrap();
    let requests = ledger.request_count();

    let second = service.load_nfts("xrpl", 50).await.data.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ledger.request_count(), requests);

    // A different limit is a different key
    let smaller = service.load_nfts("xrpl", 10).await.data.unwrap();
    assert_eq!(smaller.len(), 10);
    assert!(ledger.request_count() > requests);
}

#[tokio::test(start_paused = true)]
async fn test_scan_failure_becomes_error_envelope() {
    let ledger = MockLedger::new(|_| Err(RpcError::new("internal", "node overloaded")));
    let service = service(ledger, StubMetadata::new());

    let response = service.load_nfts("xrpl", 5).await;
    assert!(!response.success);
    assert!(response.data.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, "NETWORK_ERROR");
    assert!(error.message.contains("node overloaded"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_limit_rejected() {
    let ledger = listing_ledger();
    let service = service(ledger.clone(), StubMetadata::new());

    let response = service.load_nfts("xrpl", 0).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "INVALID_REQUEST");
    assert_eq!(ledger.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_load_xahau_uri_tokens() {
    println!("🧪 Listing URI tokens on a node without NFT offer commands");

    let pages: Vec<Vec<Value>> = vec![vec![
        uri_token(1, Some("2500000")),
        uri_token(2, None),
        uri_token(3, None),
    ]];
    let ledger = MockLedger::new(move |request| match request.command.as_str() {
        "ledger_data" => Ok(paged_state(&pages, &request.params)),
        other => Err(RpcError::new("unknownCmd", format!("Unknown method {}", other))),
    });
    let metadata = StubMetadata::new();
    let service = service(ledger.clone(), metadata.clone());

    let response = service.load_nfts("xahau", 3).await;
    assert!(response.success, "unexpected error: {:?}", response.error);
    let nfts = response.data.unwrap();
    assert_eq!(nfts.len(), 3);

    let listed = &nfts[0];
    assert_eq!(listed.id, format!("{:064X}", 1));
    assert_eq!(listed.owner, "rOwnerOfUriTokens");
    assert_eq!(listed.uri, "ipfs://QmUriFixture/1.json");
    assert_eq!(listed.sell_offers.len(), 1);
    assert_eq!(listed.sell_offers[0].amount, Amount::Drops("2500000".to_string()));
    assert_eq!(listed.sell_offers[0].owner, "rOwnerOfUriTokens");
    assert!(listed.buy_offers.is_empty());
    assert!(nfts[1..].iter().all(|nft| nft.sell_offers.is_empty() && nft.buy_offers.is_empty()));

    assert_eq!(ledger.count("nft_sell_offers"), 0);
    assert_eq!(ledger.count("nft_buy_offers"), 0);
    assert_eq!(metadata.calls(), 3);

    println!("✅ {} URI tokens listed", nfts.len());
}
