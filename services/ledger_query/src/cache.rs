//! Compute-if-absent query cache
//!
//! Two tiers: a process-wide memory map holding shared payloads, and an
//! optional directory of JSON files that survives restarts. Expiry is lazy
//! and checked on every access; nothing refreshes in the background.
//! Concurrent misses on one key may compute twice, the later write wins.

use anyhow::Context;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use types::Network;

/// Key for one query: `"<operation>_<version>:<network>:<limit>"`
pub fn cache_key(operation: &str, version: &str, network: Network, limit: usize) -> String {
    format!("{}_{}:{}:{}", operation, version, network.as_str(), limit)
}

struct MemoryEntry {
    data: Arc<dyn Any + Send + Sync>,
    computed_at: DateTime<Utc>,
    fresh_until: Instant,
}

/// On-disk form of one entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurableEntry<T> {
    data: T,
    computed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Point-in-time cache counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub computes: u64,
    pub compute_failures: u64,
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    computes: AtomicU64,
    compute_failures: AtomicU64,
    evictions: AtomicU64,
}

/// Shared query cache
pub struct QueryCache {
    memory: DashMap<String, MemoryEntry>,
    durable_dir: Option<PathBuf>,
    counters: Counters,
}

impl QueryCache {
    /// Memory tier only
    pub fn in_memory() -> Self {
        Self {
            memory: DashMap::new(),
            durable_dir: None,
            counters: Counters::default(),
        }
    }

    /// Memory tier backed by JSON files under `dir`
    pub fn durable(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).context("Failed to create cache directory")?;
        info!("Query cache persisting to {:?}", dir);
        Ok(Self {
            memory: DashMap::new(),
            durable_dir: Some(dir),
            counters: Counters::default(),
        })
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// Hits hand back the same `Arc` that was stored. Failed computes are
    /// returned to the caller and leave the cache untouched.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<Arc<T>, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.memory_hit::<T>(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        if let Some(hit) = self.durable_hit::<T>(key) {
            self.counters.durable_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Durable cache hit for {}", key);
            return Ok(hit);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.counters.computes.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {}, computing", key);

        let value = match compute().await {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.counters.compute_failures.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        if !ttl.is_zero() {
            let computed_at = Utc::now();
            self.memory.insert(
                key.to_string(),
                MemoryEntry {
                    data: value.clone(),
                    computed_at,
                    fresh_until: Instant::now() + ttl,
                },
            );
            self.write_durable(key, value.as_ref(), computed_at, ttl);
        }

        Ok(value)
    }

    /// When the live entry for `key` was computed
    pub fn computed_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let now = Instant::now();
        self.memory
            .get(key)
            .filter(|entry| entry.fresh_until > now)
            .map(|entry| entry.computed_at)
    }

    /// Drop `key` from both tiers
    pub fn invalidate(&self, key: &str) -> bool {
        let in_memory = self.memory.remove(key).is_some();
        let on_disk = match self.durable_path(key) {
            Some(path) if path.exists() => fs::remove_file(&path).is_ok(),
            _ => false,
        };
        in_memory || on_disk
    }

    /// Drop every key starting with `prefix` from both tiers.
    ///
    /// The durable directory is scanned as well, so files written by an
    /// earlier process are dropped even when they were never loaded.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let keys: Vec<String> = self
            .memory
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        let mut dropped: HashSet<String> = keys
            .iter()
            .filter(|key| self.invalidate(key))
            .map(|key| file_stem(key))
            .collect();

        if let Some(dir) = &self.durable_dir {
            let stem_prefix = file_stem(prefix);
            match fs::read_dir(dir) {
                Ok(files) => {
                    for path in files.filter_map(|file| file.ok()).map(|file| file.path()) {
                        let Some(stem) = path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .and_then(|name| name.strip_suffix(".json"))
                        else {
                            continue;
                        };
                        if !stem.starts_with(&stem_prefix) {
                            continue;
                        }
                        let stem = stem.to_string();
                        match fs::remove_file(&path) {
                            Ok(()) => {
                                dropped.insert(stem);
                            }
                            Err(e) => warn!("Failed to remove cache file {:?}: {}", path, e),
                        }
                    }
                }
                Err(e) => warn!("Failed to list cache directory {:?}: {}", dir, e),
            }
        }

        debug!("Invalidated {} cache entries under {}", dropped.len(), prefix);
        dropped.len()
    }

    /// Sweep expired memory entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.memory.len();
        self.memory.retain(|_, entry| entry.fresh_until > now);
        let removed = before - self.memory.len();
        self.counters
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.counters.hits.load(Ordering::Relaxed),
            durable_hits: self.counters.durable_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            computes: self.counters.computes.load(Ordering::Relaxed),
            compute_failures: self.counters.compute_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    fn memory_hit<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let now = Instant::now();
        let data = {
            let entry = self.memory.get(key)?;
            if entry.fresh_until > now {
                Some(entry.data.clone())
            } else {
                None
            }
        };

        match data {
            Some(data) => match data.downcast::<T>() {
                Ok(hit) => Some(hit),
                Err(_) => {
                    warn!("Cache entry {} holds a different type; recomputing", key);
                    None
                }
            },
            None => {
                if self.memory.remove_if(key, |_, entry| entry.fresh_until <= now).is_some() {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None
            }
        }
    }

    fn durable_hit<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let path = self.durable_path(key)?;
        if !path.exists() {
            return None;
        }

        let entry: DurableEntry<T> = match read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable cache file {:?}: {}", path, e);
                return None;
            }
        };

        let remaining = match (entry.expires_at - Utc::now()).to_std() {
            Ok(remaining) if !remaining.is_zero() => remaining,
            _ => {
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        let data = Arc::new(entry.data);
        self.memory.insert(
            key.to_string(),
            MemoryEntry {
                data: data.clone(),
                computed_at: entry.computed_at,
                fresh_until: Instant::now() + remaining,
            },
        );
        Some(data)
    }

    fn write_durable<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        computed_at: DateTime<Utc>,
        ttl: Duration,
    ) {
        let Some(path) = self.durable_path(key) else {
            return;
        };
        let expires_at = computed_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let entry = DurableEntry {
            data,
            computed_at,
            expires_at,
        };

        let written = serde_json::to_vec(&entry)
            .context("Failed to serialize cache entry")
            .and_then(|bytes| fs::write(&path, bytes).context("Failed to write cache file"));
        if let Err(e) = written {
            warn!("Durable cache write for {} failed: {:#}", key, e);
        }
    }

    fn durable_path(&self, key: &str) -> Option<PathBuf> {
        let dir = self.durable_dir.as_ref()?;
        Some(dir.join(format!("{}.json", file_stem(key))))
    }
}

/// File name (without extension) a key is stored under
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn read_entry<T: DeserializeOwned>(path: &Path) -> anyhow::Result<DurableEntry<T>> {
    let data = fs::read(path).context("Failed to read cache file")?;
    serde_json::from_slice(&data).context("Failed to parse cache file")
}
