//! WebSocket JSON-RPC session
//!
//! Requests carry a numeric `id`; a background reader routes responses to
//! the waiting caller. When the socket closes every in-flight request fails
//! and the drop signal fires once.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use types::{Network, RpcRequest};

use super::session::{DropSignal, LedgerSession, SessionConnector};
use crate::error::RpcError;
use crate::{LedgerError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type Pending = Arc<DashMap<u64, oneshot::Sender<std::result::Result<Value, RpcError>>>>;

/// Opens WebSocket sessions to ledger nodes
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    request_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl SessionConnector for WebSocketConnector {
    async fn connect(
        &self,
        network: Network,
        endpoint: &str,
        on_drop: DropSignal,
    ) -> Result<Arc<dyn LedgerSession>> {
        let url = url::Url::parse(endpoint).map_err(|e| LedgerError::ConnectionFailed {
            network,
            reason: format!("invalid endpoint {:?}: {}", endpoint, e),
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(LedgerError::ConnectionFailed {
                network,
                reason: format!("endpoint must be ws:// or wss://, got {}", url.scheme()),
            });
        }

        let (ws_stream, response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| LedgerError::ConnectionFailed {
                    network,
                    reason: e.to_string(),
                })?;

        tracing::debug!(
            "WebSocket handshake with {} returned {:?}",
            network,
            response.status()
        );

        let (sink, stream) = ws_stream.split();
        let pending: Pending = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let session = Arc::new(WebSocketSession {
            network,
            sink: Mutex::new(sink),
            pending: pending.clone(),
            closed: closed.clone(),
            next_id: AtomicU64::new(1),
            request_timeout: self.request_timeout,
            network_id: OnceLock::new(),
        });

        tokio::spawn(read_loop(network, stream, pending, closed, on_drop));

        match session
            .request(RpcRequest::new("server_info", json!({})))
            .await
        {
            Ok(result) => {
                if let Some(id) = result
                    .pointer("/info/network_id")
                    .and_then(Value::as_u64)
                {
                    let _ = session.network_id.set(id as u32);
                }
            }
            Err(e) => tracing::warn!("server_info on {} failed: {}", network, e),
        }

        Ok(session)
    }
}

/// One open WebSocket link
pub struct WebSocketSession {
    network: Network,
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    request_timeout: Duration,
    network_id: OnceLock<u32>,
}

#[async_trait]
impl LedgerSession for WebSocketSession {
    async fn request(&self, request: RpcRequest) -> std::result::Result<Value, RpcError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::transport(format!("{} connection closed", self.network)));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let frame = request.to_frame(id).to_string();
        if let Err(e) = self.sink.lock().await.send(Message::Text(frame)).await {
            self.pending.remove(&id);
            return Err(RpcError::transport(e.to_string()));
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RpcError::transport("response channel dropped")),
            Err(_) => {
                self.pending.remove(&id);
                Err(RpcError::new(
                    "timeout",
                    format!(
                        "{} timed out after {}ms",
                        request.command,
                        self.request_timeout.as_millis()
                    ),
                ))
            }
        }
    }

    fn network_id(&self) -> Option<u32> {
        self.network_id.get().copied()
    }

    async fn close(&self) {
        if !self.closed.load(Ordering::Acquire) {
            self.sink.lock().await.close().await.ok();
        }
    }
}

async fn read_loop(
    network: Network,
    mut stream: SplitStream<WsStream>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    on_drop: DropSignal,
) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => dispatch(&text, &pending),
            Ok(Message::Close(frame)) => {
                tracing::debug!("{} sent close frame: {:?}", network, frame);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error on {}: {}", network, e);
                break;
            }
        }
    }

    closed.store(true, Ordering::Release);

    let in_flight: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in in_flight {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(RpcError::transport(format!("{} connection closed", network))));
        }
    }

    on_drop.fire();
}

/// Route one response frame to its waiting request
fn dispatch(text: &str, pending: &Pending) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Unparseable frame: {}", e);
            return;
        }
    };

    // Stream messages carry no id
    let Some(id) = frame.get("id").and_then(Value::as_u64) else {
        return;
    };
    let Some((_, tx)) = pending.remove(&id) else {
        tracing::debug!("Response for unknown request {}", id);
        return;
    };

    let outcome = if frame.get("status").and_then(Value::as_str) == Some("success") {
        Ok(frame.get("result").cloned().unwrap_or(Value::Null))
    } else {
        Err(RpcError::from_response(&frame))
    };
    let _ = tx.send(outcome);
}
