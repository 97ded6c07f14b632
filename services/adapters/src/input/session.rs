//! RPC session seam
//!
//! A session is one live link to a ledger node. The connection manager owns
//! sessions through [`SessionConnector`]; the concrete transport lives behind
//! the trait so tests can substitute an in-process ledger.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use types::{Network, RpcRequest};

use crate::error::RpcError;
use crate::Result;

/// Fired by a session exactly when its underlying link goes away.
///
/// Carries the id the connection manager assigned to the session, so late
/// signals from a replaced session are ignored.
#[derive(Debug, Clone)]
pub struct DropSignal {
    session_id: u64,
    tx: mpsc::UnboundedSender<u64>,
}

impl DropSignal {
    pub fn new(session_id: u64, tx: mpsc::UnboundedSender<u64>) -> Self {
        Self { session_id, tx }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Notify the owner that the link dropped
    pub fn fire(&self) {
        // Owner already gone means nobody cares about the drop
        let _ = self.tx.send(self.session_id);
    }
}

/// One live RPC link to a ledger node
#[async_trait]
pub trait LedgerSession: Send + Sync {
    /// Send a request and wait for its result payload.
    ///
    /// Upstream errors come back unclassified; the request queue maps them
    /// to typed outcomes.
    async fn request(&self, request: RpcRequest) -> std::result::Result<Value, RpcError>;

    /// Network id reported by the node, if it reported one
    fn network_id(&self) -> Option<u32>;

    /// Close the link; fires the drop signal if it was still open
    async fn close(&self);
}

/// Factory for sessions
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(
        &self,
        network: Network,
        endpoint: &str,
        on_drop: DropSignal,
    ) -> Result<Arc<dyn LedgerSession>>;
}
