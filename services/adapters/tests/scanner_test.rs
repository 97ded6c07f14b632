//! Ledger scanner pagination behaviour

use ledger_adapter::testing::{MockConnector, MockLedger};
use ledger_adapter::{LedgerClients, RpcError, ScanBounds};
use ledger_config::ServiceConfig;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use types::{LedgerObjectType, Network};

fn clients(ledger: Arc<MockLedger>) -> LedgerClients {
    let mut config = ServiceConfig::default();
    config.queue.min_interval_ms = 1;
    LedgerClients::with_connector(Arc::new(config), Arc::new(MockConnector::new(ledger)))
}

fn entries(page: usize, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({ "index": format!("{:02}{:062}", page, i) }))
        .collect()
}

#[tokio::test]
async fn test_scan_stops_at_max_pages_with_endless_marker() {
    let ledger = MockLedger::new(|_| Ok(json!({ "state": entries(0, 5), "marker": "always-more" })));
    let clients = clients(ledger.clone());
    let scanner = clients.get(Network::Xrpl).scanner().clone();

    let items = scanner
        .scan(LedgerObjectType::State, ScanBounds { limit: 10_000, max_pages: 4 })
        .await
        .unwrap();

    assert_eq!(ledger.count("ledger_data"), 4);
    assert_eq!(items.len(), 20);
}

#[tokio::test]
async fn test_scan_caps_total_at_limit() {
    let pages = AtomicUsize::new(0);
    let ledger = MockLedger::new(move |_| {
        let page = pages.fetch_add(1, Ordering::SeqCst);
        let marker = if page < 2 { json!({ "page": page + 1 }) } else { Value::Null };
        Ok(json!({ "state": entries(page, 20), "marker": marker }))
    });
    let clients = clients(ledger.clone());
    let scanner = clients.get(Network::Xrpl).scanner().clone();

    let items = scanner
        .scan(LedgerObjectType::NftPage, ScanBounds { limit: 50, max_pages: 10 })
        .await
        .unwrap();

    assert_eq!(items.len(), 50);
    assert_eq!(ledger.count("ledger_data"), 3);
}

#[tokio::test]
async fn test_marker_round_trips_unmodified() {
    let marker = json!({ "ledger": 8_000_123u64, "key": "0F3A", "nested": [1, 2, 3] });
    let sent = marker.clone();
    let ledger = MockLedger::new(move |request| {
        if request.params.get("marker").is_some() {
            Ok(json!({ "state": entries(1, 2) }))
        } else {
            Ok(json!({ "state": entries(0, 2), "marker": sent.clone() }))
        }
    });
    let clients = clients(ledger.clone());
    let scanner = clients.get(Network::Xrpl).scanner().clone();

    let items = scanner
        .scan(LedgerObjectType::State, ScanBounds { limit: 100, max_pages: 10 })
        .await
        .unwrap();
    assert_eq!(items.len(), 4);

    let requests = ledger.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].request.params.get("marker").is_none());
    assert_eq!(requests[1].request.params["marker"], marker);
    assert_eq!(requests[1].request.params["ledger_index"], "validated");
    assert_eq!(requests[1].request.params["type"], "state");
}

#[tokio::test]
async fn test_stale_marker_returns_first_page() {
    println!("🧪 Second page fails with a stale marker");
    let ledger = MockLedger::new(|request| {
        if request.params.get("marker").is_some() {
            Err(RpcError::new("lgrNotFound", "ledgerNotFound"))
        } else {
            Ok(json!({ "state": entries(0, 7), "marker": "stale-soon" }))
        }
    });
    let clients = clients(ledger.clone());
    let scanner = clients.get(Network::Xrpl).scanner().clone();

    let items = scanner
        .scan(LedgerObjectType::State, ScanBounds { limit: 100, max_pages: 10 })
        .await
        .expect("stale marker must not surface as an error");

    assert_eq!(items, entries(0, 7));
    assert_eq!(ledger.count("ledger_data"), 2);
    println!("✅ Partial results returned");
}

#[tokio::test]
async fn test_unsupported_type_is_empty_without_rpc() {
    let ledger = MockLedger::new(|_| Ok(json!({ "state": entries(0, 3) })));
    let clients = clients(ledger.clone());

    let items = clients
        .get(Network::Xrpl)
        .scanner()
        .scan(LedgerObjectType::UriToken, ScanBounds { limit: 100, max_pages: 10 })
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(ledger.request_count(), 0);
}

#[tokio::test]
async fn test_upstream_type_rejection_is_empty() {
    let ledger = MockLedger::new(|_| Err(RpcError::new("invalidParams", "Invalid field 'type'.")));
    let clients = clients(ledger.clone());

    let items = clients
        .get(Network::Xahau)
        .scanner()
        .scan(LedgerObjectType::UriToken, ScanBounds { limit: 100, max_pages: 10 })
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(ledger.count("ledger_data"), 1);
}

#[tokio::test]
async fn test_other_failures_propagate() {
    let ledger = MockLedger::new(|_| Err(RpcError::new("tooBusy", "The server is too busy")));
    let clients = clients(ledger);

    let error = clients
        .get(Network::Xrpl)
        .scanner()
        .scan(LedgerObjectType::State, ScanBounds { limit: 100, max_pages: 10 })
        .await
        .unwrap_err();
    assert_eq!(error.code(), "NETWORK_ERROR");
}

#[tokio::test]
async fn test_offers_not_found_is_empty() {
    let nft_id = "000B013A95F14B0044F78A264E41713C64B5F89242540EE208C3098E00000D65";
    let ledger = MockLedger::new(|request| match request.command.as_str() {
        "nft_sell_offers" => Ok(json!({
            "nft_id": request.params["nft_id"],
            "offers": [{
                "nft_offer_index": "AA".repeat(32),
                "amount": "1000000",
                "owner": "rOwner",
                "flags": 1
            }]
        })),
        _ => Err(RpcError::new("objectNotFound", "The requested object was not found.")),
    });
    let clients = clients(ledger);
    let client = clients.get(Network::Xrpl);

    let sells = client.offers().sell_offers(nft_id).await.unwrap();
    let buys = client.offers().buy_offers(nft_id).await.unwrap();

    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].owner, "rOwner");
    assert!(sells[0].amount.is_native());
    assert!(buys.is_empty());
}
