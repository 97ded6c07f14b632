//! Ledger protocol constants
//!
//! Limits imposed by upstream nodes and the error tokens they return.

/// Largest `limit` a node honours for `ledger_data`
pub const MAX_PAGE_LIMIT: u32 = 400;

/// Smallest `limit` accepted by `nft_sell_offers`/`nft_buy_offers`
pub const MIN_OFFER_PAGE_LIMIT: u32 = 50;

/// Validated ledger selector sent with every state query
pub const VALIDATED_LEDGER: &str = "validated";

/// Engine result of a successfully applied transaction
pub const TES_SUCCESS: &str = "tesSUCCESS";

/// Upstream error tokens
pub mod codes {
    /// Account does not exist
    pub const ACCOUNT_NOT_FOUND: &str = "actNotFound";

    /// Ledger object does not exist
    pub const OBJECT_NOT_FOUND: &str = "objectNotFound";

    /// Alternate spelling used by some servers
    pub const OBJ_NOT_FOUND: &str = "objNotFound";

    /// Transaction not (yet) known
    pub const TXN_NOT_FOUND: &str = "txnNotFound";

    /// Server asks the client to back off
    pub const SLOW_DOWN: &str = "slowDown";

    /// Requested ledger is no longer available (markers into it are stale)
    pub const LEDGER_NOT_FOUND: &str = "lgrNotFound";

    /// Parameter validation failed
    pub const INVALID_PARAMS: &str = "invalidParams";
}

/// Pagination limits
pub mod pagination {
    use std::ops::RangeInclusive;

    /// Accepted range for `ledger_data` page sizes
    pub const PAGE_LIMIT_RANGE: RangeInclusive<u32> = 1..=super::MAX_PAGE_LIMIT;
}
