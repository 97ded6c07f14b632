//! Issued-token discovery
//!
//! Trust lines (`RippleState` entries) are folded into per-token
//! aggregates, merged with a fixed list of well-known tokens and ranked by
//! holder count.

use ledger_adapter::{LedgerClient, LedgerError};
use ledger_config::protocol::VALIDATED_LEDGER;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use types::{decode_hex_uri, Network, RawEntry, TokenKey};

use crate::error::Result;

/// A token listed even before any trust line to it is scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedToken {
    pub currency: &'static str,
    pub issuer: &'static str,
    pub name: &'static str,
}

static SEED_TOKENS: Lazy<HashMap<Network, Vec<SeedToken>>> = Lazy::new(|| {
    let mut seeds = HashMap::new();
    seeds.insert(
        Network::Xrpl,
        vec![
            SeedToken {
                currency: "534F4C4F00000000000000000000000000000000",
                issuer: "rsoLo2S1kiGeCcn6hCUXVrCpGMWLrRrLZz",
                name: "SOLO",
            },
            SeedToken {
                currency: "CSC",
                issuer: "rCSCManTZ8ME9EoLrSHHYKW8PPwWMgkwr",
                name: "CasinoCoin",
            },
            SeedToken {
                currency: "434F524500000000000000000000000000000000",
                issuer: "rcoreNywaoz2ZCQ8Lg2EbSLnGuRBmun6D",
                name: "CORE",
            },
            SeedToken {
                currency: "USD",
                issuer: "rvYAfWj5gh67oV6fW32ZzP3Aw4Eubs59B",
                name: "Bitstamp USD",
            },
            SeedToken {
                currency: "USD",
                issuer: "rhub8VRN55s94qWKDv6jmDy1pUykJzF3wq",
                name: "GateHub USD",
            },
        ],
    );
    seeds
});

/// Well-known tokens for a network
pub fn seed_tokens(network: Network) -> &'static [SeedToken] {
    SEED_TOKENS
        .get(&network)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Trust-line totals for one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAggregate {
    pub holders: u64,
    pub trustlines: u64,
    pub supply: Decimal,
}

/// A token ready for per-item enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCandidate {
    pub key: TokenKey,
    /// Seed name, if the token is well known
    pub name: Option<String>,
    pub aggregate: TokenAggregate,
}

/// Issuer side of one trust line.
///
/// A positive balance means the high account issues; a negative one the
/// low account. At zero the issuer is the side that set a zero limit.
fn trust_line_issuer(entry: &Value, balance: Decimal) -> Option<String> {
    let high = entry.pointer("/HighLimit/issuer")?.as_str()?;
    let low = entry.pointer("/LowLimit/issuer")?.as_str()?;

    if balance > Decimal::ZERO {
        return Some(high.to_string());
    }
    if balance < Decimal::ZERO {
        return Some(low.to_string());
    }

    let limit_is_zero = |pointer: &str| {
        entry
            .pointer(pointer)
            .and_then(Value::as_str)
            .and_then(|value| Decimal::from_str(value).ok())
            .map(|value| value.is_zero())
            .unwrap_or(false)
    };
    match (limit_is_zero("/HighLimit/value"), limit_is_zero("/LowLimit/value")) {
        (true, false) => Some(high.to_string()),
        (false, true) => Some(low.to_string()),
        _ => None,
    }
}

/// Fold `RippleState` entries into per-token aggregates
pub fn aggregate_trust_lines(entries: &[RawEntry]) -> HashMap<TokenKey, TokenAggregate> {
    let mut tokens: HashMap<TokenKey, TokenAggregate> = HashMap::new();

    for entry in entries {
        if entry.get("LedgerEntryType").and_then(Value::as_str) != Some("RippleState") {
            continue;
        }
        let Some(currency) = entry.pointer("/Balance/currency").and_then(Value::as_str) else {
            continue;
        };
        let Some(balance) = entry
            .pointer("/Balance/value")
            .and_then(Value::as_str)
            .and_then(|value| Decimal::from_str(value).ok())
        else {
            continue;
        };
        let Some(issuer) = trust_line_issuer(entry, balance) else {
            continue;
        };

        let aggregate = tokens.entry(TokenKey::new(currency, issuer)).or_default();
        aggregate.trustlines += 1;
        if !balance.is_zero() {
            aggregate.holders += 1;
            aggregate.supply = aggregate.supply.saturating_add(balance.abs());
        }
    }

    tokens
}

/// Seeds first, discovered tokens after; ranked by holders and truncated
pub fn merge_with_seeds(
    network: Network,
    mut discovered: HashMap<TokenKey, TokenAggregate>,
    limit: usize,
) -> Vec<TokenCandidate> {
    let mut candidates: Vec<TokenCandidate> = seed_tokens(network)
        .iter()
        .map(|seed| {
            let key = TokenKey::new(seed.currency, seed.issuer);
            let aggregate = discovered.remove(&key).unwrap_or_default();
            TokenCandidate {
                key,
                name: Some(seed.name.to_string()),
                aggregate,
            }
        })
        .collect();

    let mut rest: Vec<TokenCandidate> = discovered
        .into_iter()
        .map(|(key, aggregate)| TokenCandidate {
            key,
            name: None,
            aggregate,
        })
        .collect();
    // HashMap order is arbitrary; settle ties by key
    rest.sort_by(|a, b| a.key.cmp(&b.key));
    candidates.extend(rest);

    // Stable, so seeds stay ahead of equally-held discoveries
    candidates.sort_by(|a, b| b.aggregate.holders.cmp(&a.aggregate.holders));
    candidates.truncate(limit);
    candidates
}

/// Issuer's published domain, empty when the account has none or is unknown
pub async fn issuer_domain(client: &LedgerClient, issuer: &str) -> Result<String> {
    let result = client
        .queue()
        .request(
            "account_info",
            json!({ "account": issuer, "ledger_index": VALIDATED_LEDGER }),
        )
        .await;

    match result {
        Ok(result) => Ok(result
            .pointer("/account_data/Domain")
            .and_then(Value::as_str)
            .map(decode_hex_uri)
            .unwrap_or_default()),
        Err(LedgerError::NotFound(_)) => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(currency: &str, balance: &str, high: (&str, &str), low: (&str, &str)) -> Value {
        json!({
            "LedgerEntryType": "RippleState",
            "Balance": { "currency": currency, "issuer": "rrrrrrrrrrrrrrrrrrrrBZbvji", "value": balance },
            "HighLimit": { "currency": currency, "issuer": high.0, "value": high.1 },
            "LowLimit": { "currency": currency, "issuer": low.0, "value": low.1 },
        })
    }

    #[test]
    fn test_issuer_side_from_balance_sign() {
        let entries = vec![
            line("FOO", "10.5", ("rIssuer", "0"), ("rHolderA", "1000")),
            line("FOO", "-2", ("rHolderB", "1000"), ("rIssuer", "0")),
            line("FOO", "0", ("rHolderC", "1000"), ("rIssuer", "0")),
        ];
        let tokens = aggregate_trust_lines(&entries);
        let foo = &tokens[&TokenKey::new("FOO", "rIssuer")];

        assert_eq!(tokens.len(), 1);
        assert_eq!(foo.trustlines, 3);
        assert_eq!(foo.holders, 2);
        assert_eq!(foo.supply, Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_supply_saturates_at_decimal_max() {
        let huge = "50000000000000000000000000000";
        let entries = vec![
            line("BIG", huge, ("rIssuer", "0"), ("rHolderA", "1000")),
            line("BIG", huge, ("rIssuer", "0"), ("rHolderB", "1000")),
        ];
        let tokens = aggregate_trust_lines(&entries);
        let big = &tokens[&TokenKey::new("BIG", "rIssuer")];

        assert_eq!(big.holders, 2);
        assert_eq!(big.supply, Decimal::MAX);
    }

    #[test]
    fn test_ambiguous_zero_lines_skipped() {
        let entries = vec![
            line("BAR", "0", ("rA", "0"), ("rB", "0")),
            json!({ "LedgerEntryType": "Offer" }),
        ];
        assert!(aggregate_trust_lines(&entries).is_empty());
    }

    #[test]
    fn test_merge_ranks_by_holders() {
        let mut discovered = HashMap::new();
        discovered.insert(
            TokenKey::new("CSC", "rCSCManTZ8ME9EoLrSHHYKW8PPwWMgkwr"),
            TokenAggregate {
                holders: 5,
                trustlines: 6,
                supply: Decimal::from(100),
            },
        );
        discovered.insert(
            TokenKey::new("ZZZ", "rNew"),
            TokenAggregate {
                holders: 9,
                trustlines: 9,
                supply: Decimal::from(9),
            },
        );

        let merged = merge_with_seeds(Network::Xrpl, discovered, 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].key.currency, "ZZZ");
        assert_eq!(merged[0].name, None);
        assert_eq!(merged[1].key.currency, "CSC");
        assert_eq!(merged[1].aggregate.holders, 5);
        // First untouched seed keeps its position among the zero-holder seeds
        assert_eq!(merged[2].name.as_deref(), Some("SOLO"));
    }

    #[test]
    fn test_networks_without_seeds() {
        assert!(seed_tokens(Network::Xahau).is_empty());
        assert_eq!(seed_tokens(Network::Xrpl).len(), 5);
    }
}
