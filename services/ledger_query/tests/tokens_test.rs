//! Token listing: trust-line aggregation, issuer domains and prices

mod common;

use common::{service_with, test_config, StubMetadata};
use ledger_adapter::testing::MockLedger;
use ledger_adapter::RpcError;
use ledger_query::{LedgerQueryService, QueryCache};
use serde_json::{json, Value};
use std::sync::Arc;

const FOO_ISSUER: &str = "rFooIssuerAccount";
const BAR_ISSUER: &str = "rBarIssuerAccount";

/// "foo.example" as stored in an account root
const FOO_DOMAIN_HEX: &str = "666F6F2E6578616D706C65";

fn trust_line(currency: &str, balance: &str, high: (&str, &str), low: (&str, &str)) -> Value {
    json!({
        "LedgerEntryType": "RippleState",
        "Balance": { "currency": currency, "issuer": "rrrrrrrrrrrrrrrrrrrrBZbvji", "value": balance },
        "HighLimit": { "currency": currency, "issuer": high.0, "value": high.1 },
        "LowLimit": { "currency": currency, "issuer": low.0, "value": low.1 },
    })
}

fn token_ledger() -> Arc<MockLedger> {
    let lines = vec![
        trust_line("FOO", "100", (FOO_ISSUER, "0"), ("rHolderOne", "1000")),
        trust_line("FOO", "-50", ("rHolderTwo", "1000"), (FOO_ISSUER, "0")),
        trust_line("FOO", "25", (FOO_ISSUER, "0"), ("rHolderThree", "1000")),
        trust_line("FOO", "0", ("rHolderFour", "1000"), (FOO_ISSUER, "0")),
        trust_line("BAR", "10", (BAR_ISSUER, "0"), ("rHolderOne", "1000")),
    ];

    MockLedger::new(move |request| {
        let params = &request.params;
        match request.command.as_str() {
            "ledger_data" => Ok(json!({ "state": lines })),
            "account_info" if params["account"] == FOO_ISSUER => Ok(json!({
                "account_data": { "Account": FOO_ISSUER, "Domain": FOO_DOMAIN_HEX }
            })),
            "account_info" => Err(RpcError::new("actNotFound", "Account not found.")),
            "book_offers" if params["taker_gets"]["currency"] == "FOO" => Ok(json!({
                "offers": [{
                    "TakerGets": { "currency": "FOO", "issuer": FOO_ISSUER, "value": "2" },
                    "TakerPays": "5000000"
                }]
            })),
            "book_offers" if params["taker_pays"]["currency"] == "FOO" => Ok(json!({
                "offers": [{
                    "TakerGets": "3000000",
                    "TakerPays": { "currency": "FOO", "issuer": FOO_ISSUER, "value": "2" }
                }]
            })),
            "book_offers" => Ok(json!({ "offers": [] })),
            _ => Err(RpcError::new("unknownCmd", "unexpected command")),
        }
    })
}

fn token_service(ledger: Arc<MockLedger>, pricing: &mockito::ServerGuard) -> LedgerQueryService {
    let mut config = test_config();
    config.pricing.service_url = pricing.url();
    config.pricing.request_timeout_ms = 2_000;
    service_with(
        config,
        ledger,
        StubMetadata::new(),
        Arc::new(QueryCache::in_memory()),
    )
}

#[tokio::test]
async fn test_tokens_ranked_with_book_fallback() {
    println!("🧪 Pricing service down, prices from the order book");

    let mut pricing = mockito::Server::new_async().await;
    pricing
        .mock("GET", mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let ledger = token_ledger();
    let service = token_service(ledger.clone(), &pricing);

    let response = service.load_tokens("xrpl", 2).await;
    assert!(response.success, "unexpected error: {:?}", response.error);
    let tokens = response.data.unwrap();
    assert_eq!(tokens.len(), 2);

    let foo = &tokens[0];
    assert_eq!(foo.currency, "FOO");
    assert_eq!(foo.issuer, FOO_ISSUER);
    assert_eq!(foo.display_name, "FOO");
    assert_eq!(foo.domain, "foo.example");
    assert_eq!(foo.holders, 3);
    assert_eq!(foo.trustlines, 4);
    assert_eq!(foo.total_supply, "175");
    assert_eq!(foo.price_usd, None);
    assert_eq!(foo.price_native, Some(2.0));

    let bar = &tokens[1];
    assert_eq!(bar.currency, "BAR");
    assert_eq!(bar.domain, "");
    assert_eq!(bar.holders, 1);
    assert_eq!(bar.price_native, None);

    println!("✅ FOO mid price {:?}", foo.price_native);
}

#[tokio::test]
async fn test_seed_tokens_fill_the_listing() {
    let pricing = mockito::Server::new_async().await;
    let service = token_service(token_ledger(), &pricing);

    let tokens = service.load_tokens("xrpl", 4).await.data.unwrap();
    let names: Vec<&str> = tokens.iter().map(|t| t.display_name.as_str()).collect();
    assert_eq!(names, vec!["FOO", "BAR", "SOLO", "CasinoCoin"]);
    assert_eq!(tokens[2].holders, 0);
    assert_eq!(tokens[2].total_supply, "0");
}

#[tokio::test]
async fn test_service_price_preferred_over_book() {
    let mut pricing = mockito::Server::new_async().await;
    let stats = pricing
        .mock("GET", format!("/token/{}/FOO/stats", FOO_ISSUER).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "pairs": [{
                    "price": 0.5,
                    "price_xrp": 1.25,
                    "change_24h_percent": 3.5,
                    "volume_24h_xrp": 1200.0,
                    "sparkline_24h": [0.4, 0.45, 0.5]
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let ledger = token_ledger();
    let service = token_service(ledger.clone(), &pricing);

    let tokens = service.load_tokens("xrpl", 2).await.data.unwrap();
    let foo = &tokens[0];
    assert_eq!(foo.price_usd, Some(0.5));
    assert_eq!(foo.price_native, Some(1.25));
    assert_eq!(foo.change_24h, Some(3.5));
    assert_eq!(foo.sparkline, vec![0.4, 0.45, 0.5]);

    // Only BAR went to the order book
    assert_eq!(ledger.count("book_offers"), 2);
    stats.assert_async().await;
}

#[tokio::test]
async fn test_token_listing_is_cached() {
    let pricing = mockito::Server::new_async().await;
    let ledger = token_ledger();
    let service = token_service(ledger.clone(), &pricing);

    let first = service.load_tokens("xrpl", 2).await.data.unwrap();
    let requests = ledger.request_count();
    let second = service.load_tokens("xrpl", 2).await.data.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ledger.request_count(), requests);
    assert_eq!(ledger.count("ledger_data"), 1);
}
