//! Issued tokens

use serde::{Deserialize, Serialize};

/// Identity of an issued token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenKey {
    /// Currency code as it appears on ledger
    pub currency: String,
    /// Issuing account address
    pub issuer: String,
}

impl TokenKey {
    pub fn new(currency: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            issuer: issuer.into(),
        }
    }
}

/// Fully enriched token returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedToken {
    pub currency: String,
    pub issuer: String,
    /// Human-readable currency name
    pub display_name: String,
    /// Issuer domain from its account root, if published
    pub domain: String,
    /// Aggregate outstanding supply as a decimal string
    pub total_supply: String,
    /// Trust lines with a non-zero balance
    pub holders: u64,
    /// All trust lines to the issuer for this currency
    pub trustlines: u64,
    pub price_usd: Option<f64>,
    /// Price in units of the network's native asset
    pub price_native: Option<f64>,
    /// 24h change in percent
    pub change_24h: Option<f64>,
    pub sparkline: Vec<f64>,
}

/// Human-readable name for a currency code.
///
/// Three-letter codes are returned as is. 40-char hex codes are decoded to
/// text when they hold printable ASCII; AMM pool shares (prefix `03`) become
/// `"LP"`.
pub fn currency_display_name(currency: &str) -> String {
    if currency.len() != 40 || !currency.chars().all(|c| c.is_ascii_hexdigit()) {
        return currency.to_string();
    }
    if currency.starts_with("03") {
        return "LP".to_string();
    }
    match hex::decode(currency) {
        Ok(bytes) => {
            let text: String = bytes
                .iter()
                .filter(|b| **b != 0)
                .map(|b| *b as char)
                .collect();
            if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
                text.trim().to_string()
            } else {
                currency.to_string()
            }
        }
        Err(_) => currency.to_string(),
    }
}
