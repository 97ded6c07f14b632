//! Request queue ordering, spacing and error classification

use futures::future::join_all;
use ledger_adapter::testing::{MockConnector, MockLedger};
use ledger_adapter::{ConnectionConfig, ConnectionManager, LedgerError, RequestQueue, RpcError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use types::Network;

const MIN_INTERVAL: Duration = Duration::from_millis(50);

fn queue_over(ledger: Arc<MockLedger>) -> RequestQueue {
    let connector = Arc::new(MockConnector::new(ledger));
    let manager = ConnectionManager::new(Network::Xrpl, ConnectionConfig::default(), connector);
    RequestQueue::new(manager, MIN_INTERVAL)
}

fn echo_ledger() -> Arc<MockLedger> {
    MockLedger::new(|request| match request.command.as_str() {
        "not_found" => Err(RpcError::new("actNotFound", "Account not found.")),
        "slow" => Err(RpcError::new("slowDown", "You are placing too much load on the server.")),
        "busy" => Err(RpcError::new("tooBusy", "The server is too busy to help you now.")),
        _ => Ok(json!({ "seq": request.params.get("seq").cloned().unwrap_or(Value::Null) })),
    })
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_is_fifo_and_spaced() {
    println!("🧪 Enqueuing 12 tagged requests");
    let ledger = echo_ledger();
    let queue = queue_over(ledger.clone());

    let results = join_all((0..12).map(|seq| queue.request("ping", json!({ "seq": seq })))).await;
    for (seq, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap()["seq"], seq as u64);
    }

    let recorded = ledger.requests();
    assert_eq!(recorded.len(), 12);

    let order: Vec<u64> = recorded
        .iter()
        .map(|r| r.request.params["seq"].as_u64().unwrap())
        .collect();
    assert_eq!(order, (0..12).collect::<Vec<u64>>());

    for pair in recorded.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(gap >= MIN_INTERVAL, "gap {:?} below minimum interval", gap);
    }
    assert_eq!(queue.stats().dispatched(), 12);
    println!("✅ Dispatched in order with ≥{}ms spacing", MIN_INTERVAL.as_millis());
}

#[tokio::test(start_paused = true)]
async fn test_late_enqueue_reuses_drain_loop() {
    let ledger = echo_ledger();
    let queue = Arc::new(queue_over(ledger.clone()));

    queue.request("ping", json!({ "seq": 0 })).await.unwrap();

    let background = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.request("ping", json!({ "seq": 1 })).await })
    };
    queue.request("ping", json!({ "seq": 2 })).await.unwrap();
    background.await.unwrap().unwrap();

    let recorded = ledger.requests();
    assert_eq!(recorded.len(), 3);
    for pair in recorded.windows(2) {
        assert!(pair[1].at - pair[0].at >= MIN_INTERVAL);
    }
}

#[tokio::test(start_paused = true)]
async fn test_upstream_errors_are_classified() {
    let ledger = echo_ledger();
    let queue = queue_over(ledger.clone());

    match queue.request("not_found", json!({})).await {
        Err(LedgerError::NotFound(cause)) => assert_eq!(cause.code.as_deref(), Some("actNotFound")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(matches!(
        queue.request("slow", json!({})).await,
        Err(LedgerError::RateLimitExceeded(_))
    ));
    match queue.request("busy", json!({})).await {
        Err(LedgerError::Network(cause)) => {
            assert_eq!(cause.code.as_deref(), Some("tooBusy"));
            assert_eq!(cause.message, "The server is too busy to help you now.");
        }
        other => panic!("expected Network, got {:?}", other),
    }

    // Failures are never retried by the queue
    assert_eq!(ledger.count("not_found"), 1);
    assert_eq!(ledger.count("slow"), 1);
    assert_eq!(ledger.count("busy"), 1);
    assert_eq!(queue.stats().failed(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_enqueue_runs_arbitrary_calls_in_order() {
    let queue = queue_over(echo_ledger());
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let calls = (0..5).map(|i| {
        let log = log.clone();
        queue.enqueue(move || async move {
            log.lock().push(i);
            Ok::<_, LedgerError>(i * 10)
        })
    });
    let results: Vec<u32> = join_all(calls).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(results, vec![0, 10, 20, 30, 40]);
    assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
}
