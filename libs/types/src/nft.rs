//! NFT identifiers, ledger entries and normalized records

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account::AccountId;
use crate::amount::{Amount, Offer};
use crate::error::TypeError;

/// Multiplier used by the ledger to scramble taxons
const TAXON_SCRAMBLE_MUL: u32 = 384_160_001;
/// Increment used by the ledger to scramble taxons
const TAXON_SCRAMBLE_ADD: u32 = 2459;

/// Fields packed into a 256-bit NFT id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftId {
    /// Uppercase 64-char hex id
    pub raw: String,
    /// NFT flags (burnable, only-native, transferable, ...)
    pub flags: u16,
    /// Transfer fee in 1/100_000 units
    pub transfer_fee: u16,
    /// Issuing account
    pub issuer: AccountId,
    /// Unscrambled taxon
    pub taxon: u32,
    /// Mint sequence of the issuer
    pub serial: u32,
}

impl NftId {
    /// Decode a 64-char hex NFT id
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        if value.len() != 64 {
            return Err(TypeError::InvalidLength {
                kind: "nft id",
                expected: 64,
                actual: value.len(),
            });
        }
        let bytes = hex::decode(value).map_err(|_| TypeError::InvalidHex {
            kind: "nft id",
            value: value.to_string(),
        })?;

        let flags = u16::from_be_bytes([bytes[0], bytes[1]]);
        let transfer_fee = u16::from_be_bytes([bytes[2], bytes[3]]);
        let mut issuer = [0u8; 20];
        issuer.copy_from_slice(&bytes[4..24]);
        let scrambled = u32::from_be_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        let serial = u32::from_be_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]);

        Ok(Self {
            raw: value.to_ascii_uppercase(),
            flags,
            transfer_fee,
            issuer: AccountId(issuer),
            taxon: scramble_taxon(scrambled, serial),
            serial,
        })
    }
}

/// Scrambling is an xor with a serial-derived key, so it is its own inverse
pub fn scramble_taxon(taxon: u32, serial: u32) -> u32 {
    taxon ^ TAXON_SCRAMBLE_MUL
        .wrapping_mul(serial)
        .wrapping_add(TAXON_SCRAMBLE_ADD)
}

/// Decode a hex-encoded URI field to text; non-hex input is returned as is
pub fn decode_hex_uri(value: &str) -> String {
    let trimmed = value.trim();
    match hex::decode(trimmed) {
        Ok(bytes) if !trimmed.is_empty() => String::from_utf8_lossy(&bytes)
            .trim_matches(char::from(0))
            .trim()
            .to_string(),
        _ => trimmed.to_string(),
    }
}

/// Ledger object an [`NftEntry`] was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NftKind {
    /// Token held in an `NFTokenPage`; offers live in separate ledger objects
    NfToken,
    /// `URIToken` object; a sale is carried on the object itself
    UriToken {
        /// Sell terms when the token is listed for sale
        sale: Option<Offer>,
    },
}

/// An NFT as found in ledger state, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftEntry {
    /// NFT id (or URI-token index)
    pub id: String,
    /// Issuing account address
    pub issuer: String,
    /// Current owner address
    pub owner: String,
    /// Collection taxon
    pub taxon: u32,
    /// Mint serial
    pub serial: u32,
    /// Flags
    pub flags: u16,
    /// Transfer fee
    pub transfer_fee: u16,
    /// Decoded URI, if the NFT carries one
    pub uri: Option<String>,
    /// Source object kind
    pub kind: NftKind,
}

impl NftEntry {
    /// Expand one `NFTokenPage` ledger object into its NFTs.
    ///
    /// The page owner is the first 20 bytes of the page's ledger index.
    /// Tokens whose id cannot be decoded are skipped.
    pub fn from_nft_page(page: &Value) -> Vec<Self> {
        let owner = page
            .get("index")
            .and_then(Value::as_str)
            .and_then(|index| index.get(..40))
            .and_then(|prefix| AccountId::from_hex(prefix).ok())
            .map(|id| id.to_address())
            .unwrap_or_default();

        page.get("NFTokens")
            .and_then(Value::as_array)
            .map(|tokens| {
                tokens
                    .iter()
                    .filter_map(|wrapper| {
                        let token = wrapper.get("NFToken").unwrap_or(wrapper);
                        let id = NftId::parse(token.get("NFTokenID")?.as_str()?).ok()?;
                        let uri = token
                            .get("URI")
                            .and_then(Value::as_str)
                            .map(decode_hex_uri)
                            .filter(|uri| !uri.is_empty());
                        Some(Self {
                            issuer: id.issuer.to_address(),
                            owner: owner.clone(),
                            taxon: id.taxon,
                            serial: id.serial,
                            flags: id.flags,
                            transfer_fee: id.transfer_fee,
                            id: id.raw,
                            uri,
                            kind: NftKind::NfToken,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Read one `URIToken` ledger object.
    ///
    /// A token listed for sale carries `Amount` (and optionally
    /// `Destination`) on the object; that becomes its only sell offer.
    pub fn from_uri_token(object: &Value) -> Option<Self> {
        let id = object.get("index")?.as_str()?.to_ascii_uppercase();
        let owner = object.get("Owner")?.as_str()?.to_string();
        let sale = object
            .get("Amount")
            .and_then(|amount| serde_json::from_value::<Amount>(amount.clone()).ok())
            .map(|amount| Offer {
                index: id.clone(),
                amount,
                owner: owner.clone(),
                destination: object
                    .get("Destination")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                expiration: None,
            });

        Some(Self {
            id,
            issuer: object.get("Issuer")?.as_str()?.to_string(),
            owner,
            taxon: 0,
            serial: 0,
            flags: object.get("Flags").and_then(Value::as_u64).unwrap_or(0) as u16,
            transfer_fee: 0,
            uri: object
                .get("URI")
                .and_then(Value::as_str)
                .map(decode_hex_uri)
                .filter(|uri| !uri.is_empty()),
            kind: NftKind::UriToken { sale },
        })
    }
}

/// Descriptive metadata; every field defaults to blank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Image URL (already rewritten to HTTP where needed)
    pub image: String,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Collection name
    pub collection: String,
}

impl MetadataRecord {
    /// True when no field carries data
    pub fn is_blank(&self) -> bool {
        self.image.is_empty()
            && self.name.is_empty()
            && self.description.is_empty()
            && self.collection.is_empty()
    }
}

/// Fully enriched NFT returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNft {
    pub id: String,
    pub issuer: String,
    pub owner: String,
    pub taxon: u32,
    pub serial: u32,
    /// URI as stored on ledger (decoded from hex)
    pub uri: String,
    /// HTTP URL the metadata was read from, when resolution succeeded
    pub resolved_uri: String,
    pub image: String,
    pub name: String,
    pub description: String,
    pub collection: String,
    pub flags: u16,
    pub transfer_fee: u16,
    pub sell_offers: Vec<Offer>,
    pub buy_offers: Vec<Offer>,
}

impl NormalizedNft {
    /// Assemble the final record from a ledger entry and its enrichment results
    pub fn assemble(
        entry: NftEntry,
        metadata: MetadataRecord,
        resolved_uri: String,
        sell_offers: Vec<Offer>,
        buy_offers: Vec<Offer>,
    ) -> Self {
        Self {
            id: entry.id,
            issuer: entry.issuer,
            owner: entry.owner,
            taxon: entry.taxon,
            serial: entry.serial,
            uri: entry.uri.unwrap_or_default(),
            resolved_uri,
            image: metadata.image,
            name: metadata.name,
            description: metadata.description,
            collection: metadata.collection,
            flags: entry.flags,
            transfer_fee: entry.transfer_fee,
            sell_offers,
            buy_offers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_ID: &str = "000B013A95F14B0044F78A264E41713C64B5F89242540EE208C3098E00000D65";

    #[test]
    fn test_parse_nft_id_fields() {
        let id = NftId::parse(SAMPLE_ID).unwrap();
        assert_eq!(id.flags, 0x000B);
        assert_eq!(id.transfer_fee, 314);
        assert_eq!(id.serial, 3429);
        assert_eq!(
            id.issuer,
            AccountId::from_hex("95F14B0044F78A264E41713C64B5F89242540EE2").unwrap()
        );
        assert_eq!(scramble_taxon(id.taxon, id.serial), 0x08C3_098E);
    }

    #[test]
    fn test_taxon_zero_serial_zero() {
        // With serial 0 the key is just the increment
        assert_eq!(scramble_taxon(0, 0), 2459);
        assert_eq!(scramble_taxon(2459, 0), 0);
    }

    #[test]
    fn test_decode_hex_uri() {
        assert_eq!(decode_hex_uri("697066733A2F2F516D54657374"), "ipfs://QmTest");
        assert_eq!(decode_hex_uri("https://example.com/1.json"), "https://example.com/1.json");
        assert_eq!(decode_hex_uri(""), "");
    }

    #[test]
    fn test_entries_from_nft_page() {
        let page = json!({
            "LedgerEntryType": "NFTokenPage",
            "index": format!("{}{}", "00".repeat(20), "11".repeat(12)),
            "NFTokens": [
                {"NFToken": {"NFTokenID": SAMPLE_ID, "URI": "697066733A2F2F516D54657374"}},
                {"NFToken": {"NFTokenID": "bad"}}
            ]
        });

        let entries = NftEntry::from_nft_page(&page);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].owner, "rrrrrrrrrrrrrrrrrrrrrhoLvTp");
        assert_eq!(entries[0].uri.as_deref(), Some("ipfs://QmTest"));
        assert_eq!(entries[0].id, SAMPLE_ID);
    }

    #[test]
    fn test_entry_from_uri_token() {
        let entry = NftEntry::from_uri_token(&json!({
            "index": "ab".repeat(32),
            "Issuer": "rIssuer",
            "Owner": "rOwner",
            "URI": "68747470733A2F2F782E696F"
        }))
        .unwrap();
        assert_eq!(entry.uri.as_deref(), Some("https://x.io"));
        assert_eq!(entry.id, "AB".repeat(32));
        assert_eq!(entry.kind, NftKind::UriToken { sale: None });
    }

    #[test]
    fn test_uri_token_sale_becomes_offer() {
        let entry = NftEntry::from_uri_token(&json!({
            "index": "cd".repeat(32),
            "Issuer": "rIssuer",
            "Owner": "rOwner",
            "Amount": "2500000",
            "Destination": "rBuyer"
        }))
        .unwrap();

        let NftKind::UriToken { sale: Some(sale) } = entry.kind.clone() else {
            panic!("expected a sale on {:?}", entry.kind);
        };
        assert_eq!(sale.index, "CD".repeat(32));
        assert_eq!(sale.amount, Amount::Drops("2500000".to_string()));
        assert_eq!(sale.owner, "rOwner");
        assert_eq!(sale.destination.as_deref(), Some("rBuyer"));
    }

    #[test]
    fn test_page_index_with_multibyte_char_has_no_owner() {
        // Byte 40 falls inside the two-byte 'é'
        let index = format!("{}é{}", "0".repeat(39), "0".repeat(24));
        let page = json!({
            "index": index,
            "NFTokens": [{"NFToken": {"NFTokenID": SAMPLE_ID}}]
        });

        let entries = NftEntry::from_nft_page(&page);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].owner, "");
    }
}
