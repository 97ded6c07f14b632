//! Per-network FIFO request queue
//!
//! All RPC traffic for one network is funnelled through a single drain task
//! so that consecutive dispatches are at least `min_interval` apart. The
//! queue never retries: whatever the call produced is what the caller gets,
//! with upstream errors classified into typed outcomes.

use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use types::{Network, RpcRequest};

use crate::input::ConnectionManager;
use crate::{LedgerError, Result};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, bool> + Send>;

struct QueuedRequest {
    job: Job,
    enqueued_at: Instant,
}

/// Dispatch counters
#[derive(Debug, Default)]
pub struct QueueStats {
    dispatched: AtomicU64,
    failed: AtomicU64,
}

impl QueueStats {
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Rate-limited FIFO in front of a [`ConnectionManager`]
pub struct RequestQueue {
    network: Network,
    connection: ConnectionManager,
    min_interval: Duration,
    tx: mpsc::UnboundedSender<QueuedRequest>,
    rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<QueuedRequest>>>,
    stats: Arc<QueueStats>,
}

impl RequestQueue {
    pub fn new(connection: ConnectionManager, min_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            network: connection.network(),
            connection,
            min_interval,
            tx,
            rx: parking_lot::Mutex::new(Some(rx)),
            stats: Arc::new(QueueStats::default()),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Send one RPC command through the queue
    pub async fn request(&self, command: &str, params: Value) -> Result<Value> {
        let connection = self.connection.clone();
        let request = RpcRequest::new(command, params);

        self.enqueue(move || async move {
            let session = connection.get_session().await?;
            session.request(request).await.map_err(LedgerError::Network)
        })
        .await
    }

    /// Queue an arbitrary call and wait for its outcome.
    ///
    /// Calls run one at a time in submission order.
    pub async fn enqueue<T, F, Fut>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let outcome = call().await.map_err(classify);
                let succeeded = outcome.is_ok();
                // Caller may have given up waiting
                let _ = reply_tx.send(outcome);
                succeeded
            })
        });

        self.ensure_drain();
        self.tx
            .send(QueuedRequest {
                job,
                enqueued_at: Instant::now(),
            })
            .map_err(|_| LedgerError::QueueClosed)?;

        reply_rx.await.map_err(|_| LedgerError::QueueClosed)?
    }

    /// Spawn the drain task on first use
    fn ensure_drain(&self) {
        let Some(rx) = self.rx.lock().take() else {
            return;
        };
        tokio::spawn(drain(
            self.network,
            rx,
            self.min_interval,
            self.stats.clone(),
        ));
    }
}

fn classify(error: LedgerError) -> LedgerError {
    match error {
        LedgerError::Network(cause) => LedgerError::classify(cause),
        other => other,
    }
}

async fn drain(
    network: Network,
    mut rx: mpsc::UnboundedReceiver<QueuedRequest>,
    min_interval: Duration,
    stats: Arc<QueueStats>,
) {
    let mut last_dispatch: Option<Instant> = None;

    while let Some(request) = rx.recv().await {
        if let Some(last) = last_dispatch {
            let ready_at = last + min_interval;
            if Instant::now() < ready_at {
                sleep_until(ready_at).await;
            }
        }

        tracing::trace!(
            "Dispatching {} request after {}ms in queue",
            network,
            request.enqueued_at.elapsed().as_millis()
        );

        let succeeded = (request.job)().await;
        last_dispatch = Some(Instant::now());

        stats.dispatched.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            stats.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    tracing::debug!("Request queue for {} closed", network);
}
