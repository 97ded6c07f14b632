//! Ledger account identifiers
//!
//! Accounts are 20-byte ids on the wire and base58check "classic addresses"
//! everywhere a human reads them.

use std::fmt;

use crate::error::TypeError;

/// Version byte prefixed to account ids before base58check encoding
const ACCOUNT_ID_VERSION: u8 = 0x00;

/// Raw 20-byte account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// Parse from a 40-char hex string (as embedded in NFT ids and page indexes)
    pub fn from_hex(value: &str) -> Result<Self, TypeError> {
        if value.len() != 40 {
            return Err(TypeError::InvalidLength {
                kind: "account id",
                expected: 40,
                actual: value.len(),
            });
        }
        let bytes = hex::decode(value).map_err(|_| TypeError::InvalidHex {
            kind: "account id",
            value: value.to_string(),
        })?;
        let mut id = [0u8; 20];
        id.copy_from_slice(&bytes);
        Ok(Self(id))
    }

    /// Decode a classic address back to its account id
    pub fn from_address(address: &str) -> Option<Self> {
        let decoded = bs58::decode(address)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check(Some(ACCOUNT_ID_VERSION))
            .into_vec()
            .ok()?;
        let payload = match decoded.len() {
            21 => &decoded[1..],
            20 => &decoded[..],
            _ => return None,
        };
        let mut id = [0u8; 20];
        id.copy_from_slice(payload);
        Some(Self(id))
    }

    /// Classic address (`r...`)
    pub fn to_address(&self) -> String {
        encode_account_id(&self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

/// Encode raw account id bytes as a classic address
pub fn encode_account_id(id: &[u8; 20]) -> String {
    bs58::encode(id)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check_version(ACCOUNT_ID_VERSION)
        .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_addresses() {
        assert_eq!(AccountId([0u8; 20]).to_address(), "rrrrrrrrrrrrrrrrrrrrrhoLvTp");

        let mut one = [0u8; 20];
        one[19] = 1;
        assert_eq!(AccountId(one).to_address(), "rrrrrrrrrrrrrrrrrrrrBZbvji");
    }

    #[test]
    fn test_address_roundtrip() {
        let id = AccountId::from_hex("95F14B0044F78A264E41713C64B5F89242540EE2").unwrap();
        let address = id.to_address();
        assert!(address.starts_with('r'));
        assert_eq!(AccountId::from_address(&address), Some(id));
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!(AccountId::from_hex("zz").is_err());
        assert!(AccountId::from_hex(&"G".repeat(40)).is_err());
    }
}
