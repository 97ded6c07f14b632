//! NFT Metadata Resolver Implementation
//!
//! Resolves descriptive metadata for an NFT through a fixed chain of
//! sources: the structured per-item service, the CDN mirror for
//! content-addressed references, then the reference itself through every
//! gateway that can serve it. The first source that yields a non-blank
//! record wins; every failure falls through to the next source.

use ledger_adapter::{ExternalService, ServiceRateLimiter};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use types::{decode_hex_uri, MetadataRecord};

use crate::cache::MetadataCache;
use crate::config::MetadataConfig;
use crate::error::{MetadataError, Result};
use crate::normalize::normalize_metadata;
use crate::uri::{content_path, gateway_candidates};

/// Header carrying the metadata service token
const API_KEY_HEADER: &str = "x-api-key";

/// Which step of the chain produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOrigin {
    Cache,
    Service,
    Cdn,
    Gateway,
    /// Nothing answered; the record is blank
    Unresolved,
}

impl fmt::Display for MetadataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataOrigin::Cache => "cache",
            MetadataOrigin::Service => "service",
            MetadataOrigin::Cdn => "cdn",
            MetadataOrigin::Gateway => "gateway",
            MetadataOrigin::Unresolved => "unresolved",
        };
        f.write_str(name)
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record: MetadataRecord,
    /// URL the record was read from, empty when unresolved
    pub resolved_uri: String,
    pub origin: MetadataOrigin,
}

impl Resolution {
    fn unresolved() -> Self {
        Self {
            record: MetadataRecord::default(),
            resolved_uri: String::new(),
            origin: MetadataOrigin::Unresolved,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Metrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub service_hits: u64,
    pub cdn_hits: u64,
    pub gateway_hits: u64,
    pub unresolved: u64,
}

/// What the per-item service answered with
enum ServiceAnswer {
    Embedded(MetadataRecord),
    Indirect(String),
}

/// NFT Metadata Resolver
///
/// Cheap to share behind an `Arc`; every outbound call carries the
/// configured timeout and passes through the per-service quota.
pub struct MetadataResolver {
    config: MetadataConfig,

    client: Client,

    cache: Arc<MetadataCache>,

    rate_limiter: ServiceRateLimiter,

    metrics: Arc<RwLock<Metrics>>,
}

impl MetadataResolver {
    /// Create a resolver, loading the persisted record cache when enabled
    pub fn new(config: MetadataConfig) -> anyhow::Result<Self> {
        let cache = Arc::new(MetadataCache::new(
            config.cache_dir.clone(),
            config.enable_disk_cache,
            config.cache_ttl(),
        )?);
        Self::with_cache(config, cache)
    }

    /// Create a resolver sharing an existing record cache
    pub fn with_cache(config: MetadataConfig, cache: Arc<MetadataCache>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("nft-metadata-adapter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let rate_limiter = ServiceRateLimiter::new()
            .with_service(ExternalService::Metadata, config.requests_per_second)
            .with_service(ExternalService::Cdn, config.requests_per_second);

        info!(
            "NFT Metadata Resolver initialized with {} cached records, {} gateways",
            cache.len(),
            config.gateways.len()
        );

        Ok(Self {
            config,
            client,
            cache,
            rate_limiter,
            metrics: Arc::new(RwLock::new(Metrics::default())),
        })
    }

    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    /// Best-effort metadata for `uri`; blank fields when nothing answers
    pub async fn resolve(&self, uri: &str, item_id: Option<&str>) -> MetadataRecord {
        self.resolve_detailed(uri, item_id).await.record
    }

    /// Like [`resolve`](Self::resolve), also reporting where the record came from
    pub async fn resolve_detailed(&self, uri: &str, item_id: Option<&str>) -> Resolution {
        let uri = uri.trim();
        let key = cache_key(uri, item_id);

        if let Some(key) = key.as_deref() {
            if let Some(cached) = self.cache.get(key) {
                self.metrics.write().await.cache_hits += 1;
                debug!("Metadata cache hit for {}", key);
                return Resolution {
                    record: cached.record,
                    resolved_uri: cached.resolved_uri,
                    origin: MetadataOrigin::Cache,
                };
            }
        }
        self.metrics.write().await.cache_misses += 1;

        let resolution = self.resolve_uncached(uri, item_id).await;

        {
            let mut metrics = self.metrics.write().await;
            match resolution.origin {
                MetadataOrigin::Service => metrics.service_hits += 1,
                MetadataOrigin::Cdn => metrics.cdn_hits += 1,
                MetadataOrigin::Gateway => metrics.gateway_hits += 1,
                MetadataOrigin::Unresolved => metrics.unresolved += 1,
                MetadataOrigin::Cache => {}
            }
        }

        if let Some(key) = key.as_deref() {
            if let Err(e) = self
                .cache
                .insert(key, &resolution.resolved_uri, resolution.record.clone())
            {
                warn!("Failed to cache metadata for {}: {}", key, e);
            }
        }

        resolution
    }

    async fn resolve_uncached(&self, uri: &str, item_id: Option<&str>) -> Resolution {
        if let Some(id) = item_id.filter(|id| !id.is_empty()) {
            match self.fetch_from_service(id).await {
                Ok(ServiceAnswer::Embedded(record)) => {
                    return Resolution {
                        record,
                        resolved_uri: self.service_url(id),
                        origin: MetadataOrigin::Service,
                    };
                }
                // One level only: the indirect reference goes straight to the gateways
                Ok(ServiceAnswer::Indirect(reference)) => {
                    match self.fetch_from_gateways(&reference).await {
                        Ok(resolution) => return resolution,
                        Err(e) => debug!("Indirect reference for {} failed: {}", id, e),
                    }
                }
                Err(e) => debug!("Metadata service skipped for {}: {}", id, e),
            }
        }

        if let Some(path) = content_path(uri) {
            match self.fetch_from_cdn(&path).await {
                Ok(resolution) => return resolution,
                Err(e) => debug!("CDN mirror skipped for {}: {}", uri, e),
            }
        }

        match self.fetch_from_gateways(uri).await {
            Ok(resolution) => resolution,
            Err(e) => {
                if !uri.is_empty() {
                    warn!("No metadata for {}: {}", uri, e);
                }
                Resolution::unresolved()
            }
        }
    }

    fn service_url(&self, id: &str) -> String {
        format!("{}/metadata/{}", self.config.service_url.trim_end_matches('/'), id)
    }

    async fn fetch_from_service(&self, id: &str) -> Result<ServiceAnswer> {
        let url = self.service_url(id);
        self.rate_limiter.wait(ExternalService::Metadata).await;

        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        let body = self.get_json(&url, request).await?;

        let nft = body.get("nft").ok_or_else(|| MetadataError::InvalidBody {
            url: url.clone(),
            reason: "missing nft object".to_string(),
        })?;

        if let Some(doc) = nft.get("metadata").filter(|doc| doc.is_object()) {
            let record = normalize_metadata(doc, &self.config.gateways);
            if !record.is_blank() {
                return Ok(ServiceAnswer::Embedded(record));
            }
        }

        nft.get("uri")
            .and_then(Value::as_str)
            .map(decode_hex_uri)
            .filter(|reference| !reference.is_empty())
            .map(ServiceAnswer::Indirect)
            .ok_or(MetadataError::Exhausted { reference: url })
    }

    async fn fetch_from_cdn(&self, path: &str) -> Result<Resolution> {
        let url = format!("{}/cdn/{}", self.config.cdn_url.trim_end_matches('/'), path);
        self.rate_limiter.wait(ExternalService::Cdn).await;

        let body = self.get_json(&url, self.client.get(&url)).await?;
        let record = body
            .get("meta")
            .map(|doc| normalize_metadata(doc, &self.config.gateways))
            .unwrap_or_default();

        if record.is_blank() {
            return Err(MetadataError::InvalidBody {
                url,
                reason: "no usable meta".to_string(),
            });
        }
        Ok(Resolution {
            record,
            resolved_uri: url,
            origin: MetadataOrigin::Cdn,
        })
    }

    async fn fetch_from_gateways(&self, reference: &str) -> Result<Resolution> {
        let candidates = gateway_candidates(reference, &self.config.gateways);
        if candidates.is_empty() {
            return Err(MetadataError::Unsupported {
                reference: reference.to_string(),
            });
        }

        for url in candidates {
            self.rate_limiter.wait(ExternalService::Gateway).await;
            match self.fetch_candidate(&url).await {
                Ok(record) => {
                    return Ok(Resolution {
                        record,
                        resolved_uri: url,
                        origin: MetadataOrigin::Gateway,
                    })
                }
                Err(e) => debug!("Gateway candidate failed: {}", e),
            }
        }

        Err(MetadataError::Exhausted {
            reference: reference.to_string(),
        })
    }

    async fn fetch_candidate(&self, url: &str) -> Result<MetadataRecord> {
        let timeout_ms = self.config.request_timeout_ms;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataError::from_reqwest(url, e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);
        if is_image {
            return Ok(MetadataRecord {
                image: url.to_string(),
                ..MetadataRecord::default()
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MetadataError::from_reqwest(url, e, timeout_ms))?;
        let doc: Value =
            serde_json::from_slice(&bytes).map_err(|e| MetadataError::InvalidBody {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let record = normalize_metadata(&doc, &self.config.gateways);
        if record.is_blank() {
            return Err(MetadataError::InvalidBody {
                url: url.to_string(),
                reason: "no recognised fields".to_string(),
            });
        }
        Ok(record)
    }

    async fn get_json(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let timeout_ms = self.config.request_timeout_ms;
        let response = request
            .send()
            .await
            .map_err(|e| MetadataError::from_reqwest(url, e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| MetadataError::InvalidBody {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get current metrics
    pub async fn get_metrics(&self) -> Metrics {
        self.metrics.read().await.clone()
    }

    /// Force save cache to disk
    pub async fn save_cache(&self) -> anyhow::Result<()> {
        self.cache.force_snapshot()
    }
}

/// Records are cached by on-ledger URI, or by item id when there is none
fn cache_key(uri: &str, item_id: Option<&str>) -> Option<String> {
    if !uri.is_empty() {
        Some(uri.to_string())
    } else {
        item_id
            .filter(|id| !id.is_empty())
            .map(|id| format!("id:{}", id))
    }
}
