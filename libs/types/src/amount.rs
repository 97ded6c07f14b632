//! Amounts and NFT offers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Seconds between the Unix epoch and the ledger epoch (2000-01-01T00:00:00Z)
pub const LEDGER_EPOCH_OFFSET: u64 = 946_684_800;

/// A ledger amount: either native drops or an issued-currency value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// Native asset in drops, as a decimal string
    Drops(String),
    /// Issued currency
    Issued {
        /// Currency code (3-char or 40-hex)
        currency: String,
        /// Issuing account
        issuer: String,
        /// Decimal value as a string
        value: String,
    },
}

impl Amount {
    /// Whether this is a native-asset amount
    pub fn is_native(&self) -> bool {
        matches!(self, Amount::Drops(_))
    }
}

/// A sell or buy proposal referencing one NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    /// Ledger index of the offer object
    pub index: String,
    /// Asking/bidding amount
    pub amount: Amount,
    /// Account that created the offer
    pub owner: String,
    /// Only this account may accept, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Expiration in seconds since the ledger epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
}

impl Offer {
    /// Build from one entry of an `nft_sell_offers`/`nft_buy_offers` result.
    ///
    /// Returns `None` when the entry lacks an index, owner or parseable amount.
    pub fn from_rpc(entry: &Value) -> Option<Self> {
        let index = entry
            .get("nft_offer_index")
            .or_else(|| entry.get("index"))?
            .as_str()?
            .to_string();
        let amount: Amount = serde_json::from_value(entry.get("amount")?.clone()).ok()?;
        let owner = entry.get("owner")?.as_str()?.to_string();

        Some(Self {
            index,
            amount,
            owner,
            destination: entry
                .get("destination")
                .and_then(Value::as_str)
                .map(str::to_string),
            expiration: entry.get("expiration").and_then(Value::as_u64),
        })
    }

    /// Whether the offer has expired at the given Unix time (seconds)
    pub fn is_expired_at(&self, unix_secs: u64) -> bool {
        match self.expiration {
            Some(expiration) => expiration + LEDGER_EPOCH_OFFSET <= unix_secs,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offer_from_rpc_native() {
        let offer = Offer::from_rpc(&json!({
            "nft_offer_index": "AA11",
            "amount": "1000000",
            "owner": "rOwner",
            "flags": 1
        }))
        .unwrap();

        assert_eq!(offer.amount, Amount::Drops("1000000".to_string()));
        assert!(offer.amount.is_native());
        assert_eq!(offer.destination, None);
    }

    #[test]
    fn test_offer_from_rpc_issued() {
        let offer = Offer::from_rpc(&json!({
            "nft_offer_index": "BB22",
            "amount": {"currency": "USD", "issuer": "rIssuer", "value": "12.5"},
            "owner": "rOwner",
            "destination": "rBroker",
            "expiration": 10
        }))
        .unwrap();

        assert!(!offer.amount.is_native());
        assert_eq!(offer.destination.as_deref(), Some("rBroker"));
        assert!(offer.is_expired_at(LEDGER_EPOCH_OFFSET + 10));
        assert!(!offer.is_expired_at(LEDGER_EPOCH_OFFSET + 9));
    }

    #[test]
    fn test_offer_missing_owner_is_rejected() {
        assert!(Offer::from_rpc(&json!({"nft_offer_index": "CC", "amount": "1"})).is_none());
    }
}
