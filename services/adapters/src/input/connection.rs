//! Ledger connection management with automatic reconnection
//!
//! One [`ConnectionManager`] exists per network. It lazily opens a session,
//! watches for unexpected drops and reconnects with capped exponential
//! backoff. After `max_reconnect_attempts` consecutive failures it parks in
//! `Disconnected` until a caller asks for a session again.

use ledger_config::ConnectionSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use types::Network;

use super::session::{DropSignal, LedgerSession, SessionConnector};
use crate::{LedgerError, Result};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No session; the next `get_session` opens one
    Disconnected,
    /// Opening a session, either first connect or reconnect loop
    Connecting,
    /// Session established
    Connected,
}

/// Snapshot of a network's connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub network: Network,
    pub status: ConnectionStatus,
    /// Consecutive failed reconnects in the current drop episode
    pub reconnect_attempts: u32,
    /// Network id the node reported on the current session
    pub network_id: Option<u32>,
}

/// Configuration for connection management
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Node endpoint
    pub endpoint: String,
    /// Session establishment timeout
    pub connect_timeout: Duration,
    /// First reconnect delay
    pub initial_backoff: Duration,
    /// Growth factor between delays
    pub backoff_multiplier: f64,
    /// Delay ceiling
    pub max_backoff: Duration,
    /// Consecutive failures before giving up
    pub max_reconnect_attempts: u32,
}

impl ConnectionConfig {
    pub fn from_settings(endpoint: impl Into<String>, settings: &ConnectionSettings) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            backoff_multiplier: settings.backoff_multiplier,
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            max_reconnect_attempts: settings.max_reconnect_attempts,
        }
    }

    /// Delay before the reconnect that follows `attempts` failures:
    /// `min(initial * multiplier^attempts, max)`
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(attempts.min(i32::MAX as u32) as i32);
        let delay_ms = (self.initial_backoff.as_millis() as f64 * factor)
            .min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from_settings(String::new(), &ConnectionSettings::default())
    }
}

struct Inner {
    state: ConnectionState,
    session: Option<(u64, Arc<dyn LedgerSession>)>,
    /// Bumped by `connect` and `disconnect`; stale work checks it before
    /// touching state
    lifecycle: u64,
    reconnect_cancel: CancellationToken,
}

struct Shared {
    network: Network,
    config: ConnectionConfig,
    connector: Arc<dyn SessionConnector>,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<ConnectionStatus>,
    drop_tx: mpsc::UnboundedSender<u64>,
    drop_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<u64>>>,
    next_session_id: AtomicU64,
}

/// Ledger connection manager with automatic reconnection
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Create a new connection manager; nothing is opened until first use
    pub fn new(
        network: Network,
        config: ConnectionConfig,
        connector: Arc<dyn SessionConnector>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let (drop_tx, drop_rx) = mpsc::unbounded_channel();

        Self {
            shared: Arc::new(Shared {
                network,
                config,
                connector,
                inner: Mutex::new(Inner {
                    state: ConnectionState {
                        network,
                        status: ConnectionStatus::Disconnected,
                        reconnect_attempts: 0,
                        network_id: None,
                    },
                    session: None,
                    lifecycle: 0,
                    reconnect_cancel: CancellationToken::new(),
                }),
                status_tx,
                drop_tx,
                drop_rx: parking_lot::Mutex::new(Some(drop_rx)),
                next_session_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn network(&self) -> Network {
        self.shared.network
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Open a session.
    ///
    /// No-op when already `Connecting` or `Connected`.
    pub async fn connect(&self) -> Result<()> {
        let lifecycle = {
            let mut inner = self.shared.inner.lock().await;
            if inner.state.status != ConnectionStatus::Disconnected {
                return Ok(());
            }
            inner.lifecycle += 1;
            inner.state.reconnect_attempts = 0;
            inner.reconnect_cancel = CancellationToken::new();
            self.shared.set_status(&mut inner, ConnectionStatus::Connecting);
            inner.lifecycle
        };

        self.shared.ensure_supervisor();

        tracing::info!(
            "Connecting to {} at {}",
            self.shared.network,
            self.shared.config.endpoint
        );

        match self.shared.open_session().await {
            Ok((session_id, session)) => {
                if self.shared.install(lifecycle, session_id, session.clone()).await {
                    Ok(())
                } else {
                    session.close().await;
                    Err(LedgerError::ConnectionFailed {
                        network: self.shared.network,
                        reason: "disconnected while connecting".to_string(),
                    })
                }
            }
            Err(e) => {
                tracing::error!("Connection to {} failed: {}", self.shared.network, e);
                let mut inner = self.shared.inner.lock().await;
                if inner.lifecycle == lifecycle {
                    self.shared.set_status(&mut inner, ConnectionStatus::Disconnected);
                }
                Err(e)
            }
        }
    }

    /// Close the session and cancel any pending reconnect.
    ///
    /// Always ends in `Disconnected` with zero attempts.
    pub async fn disconnect(&self) {
        let session = {
            let mut inner = self.shared.inner.lock().await;
            inner.lifecycle += 1;
            inner.reconnect_cancel.cancel();
            inner.state.reconnect_attempts = 0;
            inner.state.network_id = None;
            self.shared.set_status(&mut inner, ConnectionStatus::Disconnected);
            inner.session.take()
        };

        if let Some((_, session)) = session {
            session.close().await;
        }
        tracing::info!("Disconnected from {}", self.shared.network);
    }

    /// Return the live session, connecting if needed.
    ///
    /// While a (re)connect is in progress this waits for it to settle.
    pub async fn get_session(&self) -> Result<Arc<dyn LedgerSession>> {
        let config = &self.shared.config;
        let wait_limit = config.connect_timeout + config.max_backoff;

        match timeout(wait_limit, self.wait_for_session()).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::NotConnected {
                network: self.shared.network,
            }),
        }
    }

    async fn wait_for_session(&self) -> Result<Arc<dyn LedgerSession>> {
        let mut status_rx = self.shared.status_tx.subscribe();
        loop {
            let status = {
                let inner = self.shared.inner.lock().await;
                if let (ConnectionStatus::Connected, Some((_, session))) =
                    (inner.state.status, inner.session.as_ref())
                {
                    return Ok(session.clone());
                }
                inner.state.status
            };

            match status {
                ConnectionStatus::Disconnected => self.connect().await?,
                _ => {
                    if status_rx.changed().await.is_err() {
                        return Err(LedgerError::NotConnected {
                            network: self.shared.network,
                        });
                    }
                }
            }
        }
    }

    /// Current connection snapshot
    pub async fn state(&self) -> ConnectionState {
        self.shared.inner.lock().await.state.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.shared.inner.lock().await.state.status == ConnectionStatus::Connected
    }

    /// Subscribe to status transitions
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }
}

impl Shared {
    fn set_status(&self, inner: &mut Inner, status: ConnectionStatus) {
        inner.state.status = status;
        self.status_tx.send_replace(status);
    }

    /// Spawn the drop supervisor once
    fn ensure_supervisor(self: &Arc<Self>) {
        let Some(mut drop_rx) = self.drop_rx.lock().take() else {
            return;
        };
        let weak: Weak<Shared> = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(session_id) = drop_rx.recv().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                shared.handle_drop(session_id).await;
            }
        });
    }

    async fn open_session(&self) -> Result<(u64, Arc<dyn LedgerSession>)> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let signal = DropSignal::new(session_id, self.drop_tx.clone());
        let connect = self
            .connector
            .connect(self.network, &self.config.endpoint, signal);

        match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(session)) => Ok((session_id, session)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LedgerError::ConnectionTimeout {
                network: self.network,
                timeout_ms: self.config.connect_timeout.as_millis() as u64,
            }),
        }
    }

    /// Make `session` current unless the lifecycle moved on meanwhile
    async fn install(
        &self,
        lifecycle: u64,
        session_id: u64,
        session: Arc<dyn LedgerSession>,
    ) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle != lifecycle || inner.state.status != ConnectionStatus::Connecting {
            return false;
        }

        let network_id = session.network_id();
        if let (Some(reported), expected) = (network_id, self.network.expected_network_id()) {
            if reported != expected {
                tracing::warn!(
                    "{} node reports network id {} (expected {})",
                    self.network,
                    reported,
                    expected
                );
            }
        }

        inner.session = Some((session_id, session));
        inner.state.network_id = network_id;
        inner.state.reconnect_attempts = 0;
        self.set_status(&mut inner, ConnectionStatus::Connected);
        tracing::info!("Connected to {} (session {})", self.network, session_id);
        true
    }

    async fn handle_drop(&self, session_id: u64) {
        let (lifecycle, cancel) = {
            let mut inner = self.inner.lock().await;
            let is_current = matches!(inner.session, Some((id, _)) if id == session_id);
            if !is_current || inner.state.status != ConnectionStatus::Connected {
                tracing::debug!("Ignoring drop of inactive session {}", session_id);
                return;
            }

            tracing::warn!("Connection to {} dropped unexpectedly", self.network);
            inner.session = None;
            inner.state.network_id = None;
            inner.state.reconnect_attempts = 0;
            self.set_status(&mut inner, ConnectionStatus::Connecting);
            (inner.lifecycle, inner.reconnect_cancel.clone())
        };

        self.reconnect_loop(lifecycle, cancel).await;
    }

    async fn reconnect_loop(&self, lifecycle: u64, cancel: CancellationToken) {
        loop {
            let attempts = {
                let mut inner = self.inner.lock().await;
                if inner.lifecycle != lifecycle {
                    return;
                }
                let attempts = inner.state.reconnect_attempts;
                if attempts >= self.config.max_reconnect_attempts {
                    tracing::error!(
                        "Max reconnection attempts ({}) exceeded for {}",
                        self.config.max_reconnect_attempts,
                        self.network
                    );
                    self.set_status(&mut inner, ConnectionStatus::Disconnected);
                    return;
                }
                attempts
            };

            let backoff = self.config.backoff_delay(attempts);
            tracing::info!(
                "Will reconnect to {} in {}ms (attempt {})",
                self.network,
                backoff.as_millis(),
                attempts + 1
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Reconnect to {} cancelled", self.network);
                    return;
                }
                _ = sleep(backoff) => {}
            }

            match self.open_session().await {
                Ok((session_id, session)) => {
                    if !self.install(lifecycle, session_id, session.clone()).await {
                        session.close().await;
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!("Reconnect to {} failed: {}", self.network, e);
                    let mut inner = self.inner.lock().await;
                    if inner.lifecycle == lifecycle {
                        inner.state.reconnect_attempts += 1;
                    }
                }
            }
        }
    }
}
