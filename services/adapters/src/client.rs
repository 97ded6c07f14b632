//! Per-network ledger clients
//!
//! A [`LedgerClient`] bundles the connection manager, request queue,
//! scanner, offer book and transaction monitor of one network. The
//! [`LedgerClients`] registry hands out exactly one client per network.

use dashmap::DashMap;
use ledger_config::ServiceConfig;
use std::sync::Arc;
use std::time::Duration;
use types::Network;

use crate::input::{ConnectionConfig, ConnectionManager, SessionConnector, WebSocketConnector};
use crate::offers::OfferBook;
use crate::queue::RequestQueue;
use crate::scanner::LedgerScanner;
use crate::transaction::TransactionMonitor;

/// Ledger access for one network
pub struct LedgerClient {
    network: Network,
    connection: ConnectionManager,
    queue: Arc<RequestQueue>,
    scanner: LedgerScanner,
    offers: OfferBook,
    transactions: TransactionMonitor,
}

impl LedgerClient {
    pub fn new(network: Network, config: &ServiceConfig, connector: Arc<dyn SessionConnector>) -> Self {
        let connection = ConnectionManager::new(
            network,
            ConnectionConfig::from_settings(config.endpoint(network), &config.connection),
            connector,
        );
        let queue = Arc::new(RequestQueue::new(
            connection.clone(),
            Duration::from_millis(config.queue.min_interval_ms),
        ));
        let scanner = LedgerScanner::new(queue.clone(), config.scanner.page_limit);
        let offers = OfferBook::new(scanner.clone(), config.scanner.max_offer_pages);
        let transactions = TransactionMonitor::new(queue.clone(), &config.transactions);

        Self {
            network,
            connection,
            queue,
            scanner,
            offers,
            transactions,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    pub fn scanner(&self) -> &LedgerScanner {
        &self.scanner
    }

    pub fn offers(&self) -> &OfferBook {
        &self.offers
    }

    pub fn transactions(&self) -> &TransactionMonitor {
        &self.transactions
    }
}

/// Registry holding one [`LedgerClient`] per network
pub struct LedgerClients {
    config: Arc<ServiceConfig>,
    connector: Arc<dyn SessionConnector>,
    clients: DashMap<Network, Arc<LedgerClient>>,
}

impl LedgerClients {
    /// Registry backed by real WebSocket sessions
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        let connector = Arc::new(WebSocketConnector::new(Duration::from_millis(
            config.connection.request_timeout_ms,
        )));
        Self::with_connector(config, connector)
    }

    /// Registry with an injected session factory
    pub fn with_connector(config: Arc<ServiceConfig>, connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            config,
            connector,
            clients: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Client for `network`, created on first use
    pub fn get(&self, network: Network) -> Arc<LedgerClient> {
        self.clients
            .entry(network)
            .or_insert_with(|| {
                tracing::debug!("Creating ledger client for {}", network);
                Arc::new(LedgerClient::new(network, &self.config, self.connector.clone()))
            })
            .clone()
    }

    /// Disconnect every client that was ever created
    pub async fn disconnect_all(&self) {
        let clients: Vec<Arc<LedgerClient>> =
            self.clients.iter().map(|entry| entry.value().clone()).collect();
        for client in clients {
            client.connection().disconnect().await;
        }
    }
}
