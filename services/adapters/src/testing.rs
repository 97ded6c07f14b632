//! In-process ledger for tests
//!
//! [`MockLedger`] answers requests through a closure and records every
//! dispatch with its (virtual) timestamp. [`MockConnector`] hands out
//! sessions backed by it and can be told to refuse connections or to drop
//! live sessions, which drives the connection manager's reconnect loop.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use types::{Network, RpcRequest};

use crate::error::RpcError;
use crate::input::{DropSignal, LedgerSession, SessionConnector};
use crate::{LedgerError, Result};

type Handler = dyn Fn(&RpcRequest) -> std::result::Result<Value, RpcError> + Send + Sync;

/// A request as the mock saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: RpcRequest,
    pub at: Instant,
}

/// Scripted ledger node
pub struct MockLedger {
    handler: Box<Handler>,
    log: parking_lot::Mutex<Vec<RecordedRequest>>,
}

impl MockLedger {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&RpcRequest) -> std::result::Result<Value, RpcError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            log: parking_lot::Mutex::new(Vec::new()),
        })
    }

    fn handle(&self, request: RpcRequest) -> std::result::Result<Value, RpcError> {
        let outcome = (self.handler)(&request);
        self.log.lock().push(RecordedRequest {
            request,
            at: Instant::now(),
        });
        outcome
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Number of requests for one command
    pub fn count(&self, command: &str) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|r| r.request.command == command)
            .count()
    }
}

/// Session backed by a [`MockLedger`]
pub struct MockSession {
    ledger: Arc<MockLedger>,
    signal: DropSignal,
    open: AtomicBool,
    network_id: Option<u32>,
}

impl MockSession {
    /// Simulate the transport going away
    pub fn sever(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            self.signal.fire();
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

#[async_trait]
impl LedgerSession for MockSession {
    async fn request(&self, request: RpcRequest) -> std::result::Result<Value, RpcError> {
        if !self.is_open() {
            return Err(RpcError::transport("session closed"));
        }
        self.ledger.handle(request)
    }

    fn network_id(&self) -> Option<u32> {
        self.network_id
    }

    async fn close(&self) {
        self.sever();
    }
}

/// Connector producing [`MockSession`]s
pub struct MockConnector {
    ledger: Arc<MockLedger>,
    /// Connects allowed to succeed; `None` means unlimited
    successes_left: parking_lot::Mutex<Option<usize>>,
    attempts: AtomicUsize,
    sessions: parking_lot::Mutex<Vec<Arc<MockSession>>>,
}

impl MockConnector {
    pub fn new(ledger: Arc<MockLedger>) -> Self {
        Self {
            ledger,
            successes_left: parking_lot::Mutex::new(None),
            attempts: AtomicUsize::new(0),
            sessions: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Let only the next `successes` connects succeed; later ones fail
    pub fn succeed_times(self, successes: usize) -> Self {
        *self.successes_left.lock() = Some(successes);
        self
    }

    /// Allow connects to succeed again from now on
    pub fn heal(&self) {
        *self.successes_left.lock() = None;
    }

    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Drop every open session, as if the node went away
    pub fn sever_all(&self) {
        let sessions: Vec<Arc<MockSession>> = self.sessions.lock().clone();
        for session in sessions {
            session.sever();
        }
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(
        &self,
        network: Network,
        _endpoint: &str,
        on_drop: DropSignal,
    ) -> Result<Arc<dyn LedgerSession>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        {
            let mut successes_left = self.successes_left.lock();
            match successes_left.as_mut() {
                Some(0) => {
                    return Err(LedgerError::ConnectionFailed {
                        network,
                        reason: "connection refused".to_string(),
                    })
                }
                Some(left) => *left -= 1,
                None => {}
            }
        }

        let session = Arc::new(MockSession {
            ledger: self.ledger.clone(),
            signal: on_drop,
            open: AtomicBool::new(true),
            network_id: Some(network.expected_network_id()),
        });
        self.sessions.lock().push(session.clone());
        Ok(session)
    }
}
