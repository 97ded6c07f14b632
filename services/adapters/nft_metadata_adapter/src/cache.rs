//! Resolved metadata caching with optional persistent storage
//!
//! Records are keyed by the on-ledger URI. Entries expire after the
//! configured TTL; blanks are never stored so a later call can retry.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use types::MetadataRecord;

/// A resolved record and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMetadata {
    /// On-ledger URI the record was resolved for
    pub uri: String,

    /// HTTP URL the record was read from
    pub resolved_uri: String,

    pub record: MetadataRecord,

    /// Wall-clock expiry, so persisted entries age across restarts
    pub expires_at: DateTime<Utc>,
}

struct Slot {
    entry: CachedMetadata,
    fresh_until: Instant,
}

/// Thread-safe metadata cache
pub struct MetadataCache {
    cache: Arc<DashMap<String, Slot>>,

    ttl: Duration,

    /// Path to persistent cache file
    cache_file: PathBuf,

    /// Whether disk persistence is enabled
    persist_to_disk: bool,
}

impl MetadataCache {
    /// In-memory cache only
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
            cache_file: PathBuf::new(),
            persist_to_disk: false,
        }
    }

    /// Create a cache, loading previously persisted entries when enabled
    pub fn new(cache_dir: PathBuf, persist_to_disk: bool, ttl: Duration) -> Result<Self> {
        if persist_to_disk {
            fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;
        }

        let mut cache = Self {
            cache: Arc::new(DashMap::new()),
            ttl,
            cache_file: cache_dir.join("nft_metadata.json"),
            persist_to_disk,
        };

        if persist_to_disk {
            cache.load_from_disk()?;
        }

        Ok(cache)
    }

    /// Fresh record for `uri`; expired entries are dropped on read
    pub fn get(&self, uri: &str) -> Option<CachedMetadata> {
        let now = Instant::now();
        if let Some(slot) = self.cache.get(uri) {
            if slot.fresh_until > now {
                return Some(slot.entry.clone());
            }
        }
        self.cache.remove_if(uri, |_, slot| slot.fresh_until <= now);
        None
    }

    /// Store a resolved record; blank records are ignored
    pub fn insert(&self, uri: &str, resolved_uri: &str, record: MetadataRecord) -> Result<()> {
        if record.is_blank() || self.ttl.is_zero() {
            return Ok(());
        }

        let entry = CachedMetadata {
            uri: uri.to_string(),
            resolved_uri: resolved_uri.to_string(),
            record,
            expires_at: Utc::now()
                + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
        };
        self.cache.insert(
            uri.to_string(),
            Slot {
                entry,
                fresh_until: Instant::now() + self.ttl,
            },
        );

        if self.persist_to_disk {
            self.save_to_disk()?;
        }

        Ok(())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    /// Number of stored entries, including ones not yet swept
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.cache.len();
        self.cache.retain(|_, slot| slot.fresh_until > now);
        before - self.cache.len()
    }

    fn load_from_disk(&mut self) -> Result<()> {
        if !self.cache_file.exists() {
            info!("No existing metadata cache found at {:?}", self.cache_file);
            return Ok(());
        }

        let data = fs::read_to_string(&self.cache_file).context("Failed to read cache file")?;

        let entries: Vec<CachedMetadata> =
            serde_json::from_str(&data).context("Failed to parse cache file")?;

        let now = Utc::now();
        let mut skipped = 0;
        for entry in entries {
            let remaining = match (entry.expires_at - now).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            self.cache.insert(
                entry.uri.clone(),
                Slot {
                    fresh_until: Instant::now() + remaining.min(self.ttl),
                    entry,
                },
            );
        }

        if skipped > 0 {
            debug!("Skipped {} expired metadata entries on load", skipped);
        }
        info!("Loaded {} metadata records from disk cache", self.cache.len());
        Ok(())
    }

    fn save_to_disk(&self) -> Result<()> {
        let now = Instant::now();
        let entries: Vec<CachedMetadata> = self
            .cache
            .iter()
            .filter(|slot| slot.fresh_until > now)
            .map(|slot| slot.entry.clone())
            .collect();

        let data = serde_json::to_string_pretty(&entries).context("Failed to serialize cache")?;

        fs::write(&self.cache_file, data).context("Failed to write cache file")?;

        debug!("Saved {} metadata records to disk cache", entries.len());
        Ok(())
    }

    /// Force a snapshot to disk (for graceful shutdown)
    pub fn force_snapshot(&self) -> Result<()> {
        if self.persist_to_disk {
            if let Err(e) = self.save_to_disk() {
                warn!("Metadata cache snapshot failed: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MetadataRecord {
        MetadataRecord {
            name: name.to_string(),
            ..MetadataRecord::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = MetadataCache::in_memory(Duration::from_secs(60));
        cache.insert("ipfs://a", "https://gw/a", record("A")).unwrap();
        assert_eq!(cache.get("ipfs://a").unwrap().record.name, "A");

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("ipfs://a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_blank_records_not_cached() {
        let cache = MetadataCache::in_memory(Duration::from_secs(60));
        cache.insert("ipfs://a", "", MetadataRecord::default()).unwrap();
        assert!(!cache.contains("ipfs://a"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = MetadataCache::in_memory(Duration::from_secs(10));
        cache.insert("a", "", record("A")).unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.insert("b", "", record("B")).unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.contains("b"));
    }
}
