//! Ledger network identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;

/// A ledger network the access layer can connect to.
///
/// One connection manager and one request queue exist per network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// XRP Ledger mainnet
    Xrpl,
    /// XRP Ledger public testnet
    XrplTestnet,
    /// Xahau mainnet
    Xahau,
}

impl Network {
    /// All known networks
    pub const ALL: [Network; 3] = [Network::Xrpl, Network::XrplTestnet, Network::Xahau];

    /// Canonical lowercase name, used in cache keys and config sections
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Xrpl => "xrpl",
            Network::XrplTestnet => "testnet",
            Network::Xahau => "xahau",
        }
    }

    /// Network id advertised by `server_info` on this network
    pub fn expected_network_id(&self) -> u32 {
        match self {
            Network::Xrpl => 0,
            Network::XrplTestnet => 1,
            Network::Xahau => 21337,
        }
    }

    /// Public WebSocket endpoint used when no endpoint is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Network::Xrpl => "wss://xrplcluster.com",
            Network::XrplTestnet => "wss://s.altnet.rippletest.net:51233",
            Network::Xahau => "wss://xahau.network",
        }
    }

    /// Whether `uri_token` ledger objects exist on this network
    pub fn supports_uri_tokens(&self) -> bool {
        matches!(self, Network::Xahau)
    }

    /// Ticker of the native asset
    pub fn native_currency(&self) -> &'static str {
        match self {
            Network::Xrpl | Network::XrplTestnet => "XRP",
            Network::Xahau => "XAH",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xrpl" | "xrp" | "mainnet" => Ok(Network::Xrpl),
            "testnet" | "xrpl-testnet" | "xrpl_testnet" => Ok(Network::XrplTestnet),
            "xahau" => Ok(Network::Xahau),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("XRPL".parse::<Network>().unwrap(), Network::Xrpl);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Xrpl);
        assert_eq!(" testnet ".parse::<Network>().unwrap(), Network::XrplTestnet);
        assert_eq!("xahau".parse::<Network>().unwrap(), Network::Xahau);
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn test_uri_token_support() {
        assert!(Network::Xahau.supports_uri_tokens());
        assert!(!Network::Xrpl.supports_uri_tokens());
    }
}
