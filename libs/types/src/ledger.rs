//! Ledger-state listings and RPC request shapes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::network::Network;

/// One raw ledger object as returned by the node
pub type RawEntry = Value;

/// Object kinds accepted by `ledger_data`'s `type` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerObjectType {
    /// `NFTokenPage` objects, each holding up to 32 NFTs
    NftPage,
    /// `RippleState` trust lines
    State,
    /// `NFTokenOffer` objects
    NftOffer,
    /// DEX `Offer` objects
    Offer,
    /// `URIToken` objects (Xahau only)
    UriToken,
}

impl LedgerObjectType {
    /// Value sent in the `type` field of `ledger_data`
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerObjectType::NftPage => "nft_page",
            LedgerObjectType::State => "state",
            LedgerObjectType::NftOffer => "nft_offer",
            LedgerObjectType::Offer => "offer",
            LedgerObjectType::UriToken => "uri_token",
        }
    }

    /// Whether the network knows about this object kind at all
    pub fn supported_on(&self, network: Network) -> bool {
        match self {
            LedgerObjectType::UriToken => network.supports_uri_tokens(),
            LedgerObjectType::NftPage | LedgerObjectType::NftOffer => {
                !matches!(network, Network::Xahau)
            }
            LedgerObjectType::State | LedgerObjectType::Offer => true,
        }
    }
}

impl fmt::Display for LedgerObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a paginated listing.
///
/// `marker` is opaque: it must be sent back exactly as received, and its
/// absence ends the scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerPage {
    /// Entries on this page
    pub items: Vec<RawEntry>,
    /// Continuation token for the next page
    pub marker: Option<Value>,
}

impl LedgerPage {
    /// Split an RPC result into items (under `items_key`) and marker
    pub fn from_result(result: &Value, items_key: &str) -> Self {
        let items = result
            .get(items_key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let marker = result.get("marker").filter(|m| !m.is_null()).cloned();
        Self { items, marker }
    }

    /// Whether another page should be requested
    pub fn has_more(&self) -> bool {
        self.marker.is_some()
    }
}

/// Command sent over the persistent RPC session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Command name, e.g. `ledger_data`
    pub command: String,
    /// Command parameters (must be a JSON object)
    pub params: Value,
}

impl RpcRequest {
    /// Create a request; non-object params are treated as empty
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        let params = if params.is_object() {
            params
        } else {
            Value::Object(Map::new())
        };
        Self {
            command: command.into(),
            params,
        }
    }

    /// Flatten into a WebSocket frame `{id, command, ...params}`
    pub fn to_frame(&self, id: u64) -> Value {
        let mut frame = Map::new();
        if let Value::Object(params) = &self.params {
            for (key, value) in params {
                frame.insert(key.clone(), value.clone());
            }
        }
        frame.insert("id".to_string(), Value::from(id));
        frame.insert("command".to_string(), Value::from(self.command.clone()));
        Value::Object(frame)
    }
}
