//! Service defaults
//!
//! Default configuration values shared by the ledger access crates.

/// Connection manager defaults
pub mod connection {
    /// Connection establishment timeout (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;

    /// Per-request timeout on the RPC session (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 20_000;

    /// First reconnect delay (milliseconds)
    pub const INITIAL_BACKOFF_MS: u64 = 1_000;

    /// Growth factor between reconnect delays
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Reconnect delay ceiling (milliseconds)
    pub const MAX_BACKOFF_MS: u64 = 30_000;

    /// Consecutive failed reconnects before giving up
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
}

/// Request queue defaults
pub mod queue {
    /// Minimum spacing between dispatched requests (20 req/s)
    pub const MIN_INTERVAL_MS: u64 = 50;
}

/// Ledger scanner defaults
pub mod scanner {
    /// Entries requested per page
    pub const PAGE_LIMIT: u32 = 400;

    /// Hard bound on pages per scan
    pub const MAX_PAGES: u32 = 10;

    /// Pages followed when listing offers for one NFT
    pub const MAX_OFFER_PAGES: u32 = 3;
}

/// Metadata resolver defaults
pub mod metadata {
    /// Structured per-item metadata service
    pub const SERVICE_URL: &str = "https://bithomp.com/api/v2";

    /// CDN mirror keyed by content hash
    pub const CDN_URL: &str = "https://cdn.bithomp.com";

    /// Content-address gateways in priority order
    pub const GATEWAYS: [&str; 4] = [
        "https://ipfs.io/ipfs/",
        "https://cloudflare-ipfs.com/ipfs/",
        "https://gateway.pinata.cloud/ipfs/",
        "https://dweb.link/ipfs/",
    ];

    /// Timeout for each metadata call (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 5_000;

    /// How long a resolved record is reused (seconds)
    pub const CACHE_TTL_SECS: u64 = 3_600;

    /// Outbound quota towards the metadata service
    pub const REQUESTS_PER_SECOND: u32 = 10;
}

/// Pricing service defaults
pub mod pricing {
    pub const SERVICE_URL: &str = "https://api.xrpscan.com/api/v1";

    pub const REQUEST_TIMEOUT_MS: u64 = 8_000;

    pub const REQUESTS_PER_SECOND: u32 = 5;
}

/// Cache layer defaults
pub mod cache {
    /// Token listings change slowly
    pub const TOKEN_TTL_SECS: u64 = 3_600;

    /// NFT listings change with every trade
    pub const NFT_TTL_SECS: u64 = 300;

    /// Durable cache location
    pub const CACHE_DIR: &str = "./data/query_cache";

    /// Bumped whenever the cached payload shape changes
    pub const KEY_VERSION: &str = "v1";
}

/// Enrichment pipeline defaults
pub mod enrichment {
    /// Items enriched concurrently
    pub const BATCH_SIZE: usize = 3;

    /// Upper bound on enriching a single item (milliseconds)
    pub const ITEM_TIMEOUT_MS: u64 = 30_000;
}

/// Transaction monitoring defaults
pub mod transactions {
    pub const POLL_INTERVAL_MS: u64 = 1_000;

    pub const VALIDATION_TIMEOUT_MS: u64 = 60_000;
}
