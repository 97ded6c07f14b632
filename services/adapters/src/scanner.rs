//! Marker-paginated ledger scans
//!
//! A scan repeats one query, feeding back the opaque `marker` of each page,
//! until the marker disappears, enough items are collected or the page
//! budget runs out. A marker that went stale ends the scan with whatever
//! was collected so far.

use ledger_config::protocol::{pagination, VALIDATED_LEDGER};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use types::{LedgerObjectType, LedgerPage, RawEntry};

use crate::queue::RequestQueue;
use crate::Result;

/// One paginated RPC query
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuery {
    pub command: String,
    /// Parameters sent with every page (without `marker`)
    pub params: Value,
    /// Result field holding the page items
    pub items_key: String,
}

impl PagedQuery {
    pub fn new(command: impl Into<String>, params: Value, items_key: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params,
            items_key: items_key.into(),
        }
    }

    /// `ledger_data` against the validated ledger, filtered by type
    pub fn ledger_data(object_type: LedgerObjectType, page_limit: u32) -> Self {
        let limit = page_limit.clamp(*pagination::PAGE_LIMIT_RANGE.start(), *pagination::PAGE_LIMIT_RANGE.end());
        Self::new(
            "ledger_data",
            json!({
                "ledger_index": VALIDATED_LEDGER,
                "type": object_type.as_str(),
                "limit": limit,
            }),
            "state",
        )
    }

    fn params_with_marker(&self, marker: Option<&Value>) -> Value {
        let mut params = match &self.params {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Some(marker) = marker {
            params.insert("marker".to_string(), marker.clone());
        }
        Value::Object(params)
    }
}

/// Bounds for a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
    /// Stop once this many items are collected
    pub limit: usize,
    /// Never request more than this many pages
    pub max_pages: u32,
}

/// Paginating reader over one network's request queue
#[derive(Clone)]
pub struct LedgerScanner {
    queue: Arc<RequestQueue>,
    page_limit: u32,
}

impl LedgerScanner {
    pub fn new(queue: Arc<RequestQueue>, page_limit: u32) -> Self {
        Self { queue, page_limit }
    }

    /// Scan ledger objects of one type.
    ///
    /// Types the network does not have yield an empty result instead of an
    /// error.
    pub async fn scan(&self, object_type: LedgerObjectType, bounds: ScanBounds) -> Result<Vec<RawEntry>> {
        let network = self.queue.network();
        if !object_type.supported_on(network) {
            tracing::debug!("{} objects do not exist on {}", object_type.as_str(), network);
            return Ok(Vec::new());
        }

        let query = PagedQuery::ledger_data(object_type, page_size(self.page_limit, bounds.limit));
        match self.paginate(&query, bounds).await {
            Err(e) if e.is_unsupported_type() => {
                tracing::warn!(
                    "{} rejected object type {}: {}",
                    network,
                    object_type.as_str(),
                    e
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Follow markers for an arbitrary paged query
    pub async fn paginate(&self, query: &PagedQuery, bounds: ScanBounds) -> Result<Vec<RawEntry>> {
        let mut items: Vec<RawEntry> = Vec::new();
        let mut marker: Option<Value> = None;
        let mut pages = 0u32;

        while pages < bounds.max_pages && items.len() < bounds.limit {
            let params = query.params_with_marker(marker.as_ref());
            pages += 1;

            let result = match self.queue.request(&query.command, params).await {
                Ok(result) => result,
                Err(e) if e.is_stale_marker() => {
                    tracing::warn!(
                        "Stale marker on {} page {}; returning {} items collected so far",
                        query.command,
                        pages,
                        items.len()
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let page = LedgerPage::from_result(&result, &query.items_key);
            let remaining = bounds.limit - items.len();
            items.extend(page.items.into_iter().take(remaining));

            match page.marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            "{} scan finished: {} items over {} pages",
            query.command,
            items.len(),
            pages
        );
        Ok(items)
    }
}

/// Items to ask for per page: the configured size, capped by the scan limit
fn page_size(page_limit: u32, limit: usize) -> u32 {
    page_limit.min(u32::try_from(limit).unwrap_or(u32::MAX).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_follows_scan_limit() {
        assert_eq!(page_size(200, 50), 50);
        assert_eq!(page_size(200, 0), 1);
        assert_eq!(page_size(200, (u32::MAX as usize).saturating_add(1)), 200);
        assert_eq!(page_size(200, usize::MAX), 200);
    }

    #[test]
    fn test_ledger_data_query_clamps_limit() {
        let query = PagedQuery::ledger_data(LedgerObjectType::NftPage, 5000);
        assert_eq!(query.command, "ledger_data");
        assert_eq!(query.params["limit"], 400);
        assert_eq!(query.params["type"], "nft_page");
        assert_eq!(query.params["ledger_index"], "validated");
        assert_eq!(query.items_key, "state");
    }

    #[test]
    fn test_marker_only_added_when_present() {
        let query = PagedQuery::ledger_data(LedgerObjectType::State, 100);
        assert!(query.params_with_marker(None).get("marker").is_none());

        let marker = json!({"ledger": 5, "seq": 9});
        let params = query.params_with_marker(Some(&marker));
        assert_eq!(params["marker"], marker);
        assert_eq!(params["limit"], 100);
    }
}
