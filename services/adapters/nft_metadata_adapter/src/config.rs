//! Configuration for the NFT metadata resolver

use ledger_config::{defaults, CacheSettings, MetadataSettings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Structured per-item metadata service
    pub service_url: String,

    /// CDN mirror keyed by content hash
    pub cdn_url: String,

    /// Content-address gateways, tried in this order
    pub gateways: Vec<String>,

    /// Token sent to the metadata service, if it wants one
    pub api_key: Option<String>,

    /// Timeout for each outbound call in milliseconds
    pub request_timeout_ms: u64,

    /// How long a resolved record is reused, in seconds
    pub cache_ttl_secs: u64,

    /// Quota towards the metadata service and CDN
    pub requests_per_second: u32,

    /// Directory for the persisted record cache
    pub cache_dir: PathBuf,

    /// Persist resolved records across restarts
    pub enable_disk_cache: bool,
}

impl MetadataConfig {
    /// Records persist next to the query cache when that one is durable
    pub fn from_settings(settings: &MetadataSettings, cache: &CacheSettings) -> Self {
        Self {
            service_url: settings.service_url.clone(),
            cdn_url: settings.cdn_url.clone(),
            gateways: settings.gateways.clone(),
            api_key: settings.api_key.clone(),
            request_timeout_ms: settings.request_timeout_ms,
            cache_ttl_secs: settings.cache_ttl_secs,
            requests_per_second: settings.requests_per_second,
            cache_dir: cache.cache_dir.join("metadata"),
            enable_disk_cache: cache.durable,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for MetadataConfig {
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
            cache_dir: PathBuf::from("./data/metadata_cache"),
            enable_disk_cache: false,
        }
    }
}
