//! Service Configuration Module
//!
//! Provides configuration loading and management for the ledger access
//! services. Supports loading from TOML files with environment-specific
//! overrides and `LEDGER_` environment variables.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::Network;

use crate::defaults;

/// Default location of the base configuration file
const DEFAULT_CONFIG_PATH: &str = "config/ledger.toml";

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Per-network endpoints, keyed by network name
    pub networks: HashMap<String, NetworkSettings>,
    pub connection: ConnectionSettings,
    pub queue: QueueSettings,
    pub scanner: ScannerSettings,
    pub metadata: MetadataSettings,
    pub pricing: PricingSettings,
    pub cache: CacheSettings,
    pub enrichment: EnrichmentSettings,
    pub transactions: TransactionSettings,
    pub logging: LoggingSettings,
}

/// Endpoint settings for one network
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkSettings {
    /// WebSocket endpoint
    pub endpoint: String,
    pub enabled: bool,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            enabled: true,
        }
    }
}

/// Connection manager settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: defaults::connection::CONNECT_TIMEOUT_MS,
            request_timeout_ms: defaults::connection::REQUEST_TIMEOUT_MS,
            initial_backoff_ms: defaults::connection::INITIAL_BACKOFF_MS,
            backoff_multiplier: defaults::connection::BACKOFF_MULTIPLIER,
            max_backoff_ms: defaults::connection::MAX_BACKOFF_MS,
            max_reconnect_attempts: defaults::connection::MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Request queue settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct QueueSettings {
    pub min_interval_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: defaults::queue::MIN_INTERVAL_MS,
        }
    }
}

/// Ledger scanner settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScannerSettings {
    pub page_limit: u32,
    pub max_pages: u32,
    pub max_offer_pages: u32,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            page_limit: defaults::scanner::PAGE_LIMIT,
            max_pages: defaults::scanner::MAX_PAGES,
            max_offer_pages: defaults::scanner::MAX_OFFER_PAGES,
        }
    }
}

/// Metadata resolver settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MetadataSettings {
    pub service_url: String,
    pub cdn_url: String,
    /// Gateway prefixes in priority order, each ending in `/ipfs/`
    pub gateways: Vec<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub requests_per_second: u32,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            service_url: defaults::metadata::SERVICE_URL.to_string(),
            cdn_url: defaults::metadata::CDN_URL.to_string(),
            gateways: defaults::metadata::GATEWAYS
                .iter()
                .map(|g| g.to_string())
                .collect(),
            api_key: None,
            request_timeout_ms: defaults::metadata::REQUEST_TIMEOUT_MS,
            cache_ttl_secs: defaults::metadata::CACHE_TTL_SECS,
            requests_per_second: defaults::metadata::REQUESTS_PER_SECOND,
        }
    }
}

/// Pricing service settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PricingSettings {
    pub service_url: String,
    pub request_timeout_ms: u64,
    pub requests_per_second: u32,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            service_url: defaults::pricing::SERVICE_URL.to_string(),
            request_timeout_ms: defaults::pricing::REQUEST_TIMEOUT_MS,
            requests_per_second: defaults::pricing::REQUESTS_PER_SECOND,
        }
    }
}

/// Cache layer settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub token_ttl_secs: u64,
    pub nft_ttl_secs: u64,
    pub cache_dir: PathBuf,
    /// Persist entries to `cache_dir` as well as memory
    pub durable: bool,
    pub key_version: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: defaults::cache::TOKEN_TTL_SECS,
            nft_ttl_secs: defaults::cache::NFT_TTL_SECS,
            cache_dir: PathBuf::from(defaults::cache::CACHE_DIR),
            durable: false,
            key_version: defaults::cache::KEY_VERSION.to_string(),
        }
    }
}

/// Enrichment pipeline settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub batch_size: usize,
    pub item_timeout_ms: u64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: defaults::enrichment::BATCH_SIZE,
            item_timeout_ms: defaults::enrichment::ITEM_TIMEOUT_MS,
        }
    }
}

/// Transaction monitoring settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TransactionSettings {
    pub poll_interval_ms: u64,
    pub validation_timeout_ms: u64,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::transactions::POLL_INTERVAL_MS,
            validation_timeout_ms: defaults::transactions::VALIDATION_TIMEOUT_MS,
        }
    }
}

/// Logging settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let mut builder = match base_path {
            Some(path) => Config::builder().add_source(File::from(path).required(true)),
            None => Config::builder()
                .add_source(File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false)),
        };

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (LEDGER_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("LEDGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Endpoint for a network, falling back to its public default
    pub fn endpoint(&self, network: Network) -> String {
        self.networks
            .get(network.as_str())
            .map(|settings| settings.endpoint.trim())
            .filter(|endpoint| !endpoint.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| network.default_endpoint().to_string())
    }

    /// Whether a network may be queried
    pub fn is_enabled(&self, network: Network) -> bool {
        self.networks
            .get(network.as_str())
            .map(|settings| settings.enabled)
            .unwrap_or(true)
    }

    /// Expand environment variables in endpoint URLs and paths
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for (name, network) in &mut self.networks {
            let expanded = shellexpand::env(&network.endpoint)
                .with_context(|| format!("Failed to expand endpoint for network {}", name))?;
            network.endpoint = expanded.to_string();
        }

        self.metadata.service_url = shellexpand::env(&self.metadata.service_url)
            .context("Failed to expand metadata service URL")?
            .to_string();
        self.metadata.cdn_url = shellexpand::env(&self.metadata.cdn_url)
            .context("Failed to expand metadata CDN URL")?
            .to_string();
        if let Some(key) = &self.metadata.api_key {
            let expanded = shellexpand::env(key).context("Failed to expand metadata API key")?;
            self.metadata.api_key = Some(expanded.to_string());
        }
        self.pricing.service_url = shellexpand::env(&self.pricing.service_url)
            .context("Failed to expand pricing service URL")?
            .to_string();

        let cache_dir = self.cache.cache_dir.to_string_lossy().to_string();
        let expanded =
            shellexpand::full(&cache_dir).context("Failed to expand cache directory")?;
        self.cache.cache_dir = PathBuf::from(expanded.as_ref());

        debug!("Expanded environment references in configuration");
        Ok(())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(base_path: Option<&Path>, environment: Option<&str>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load(base_path, environment)?;
    config.expand_env_vars()?;
    Ok(config)
}
