//! 20-byte account / contract address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Domain separator for contract address derivation
const CONTRACT_ADDRESS_DOMAIN: &[u8] = b"DOMAINS_CONTRACT_ADDRESS_V1";

/// Errors returned when parsing an address from its hex form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Address must be 20 bytes (got {0})")]
    InvalidLength(usize),
}

/// Account or contract address
///
/// The all-zero address is the "not found" sentinel returned by every read
/// path that misses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an address whose last eight bytes hold `value` (big-endian)
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Deterministic address for the `nonce`-th contract deployed by `deployer`
    ///
    /// ```text
    /// address = BLAKE3("DOMAINS_CONTRACT_ADDRESS_V1" || deployer || nonce:u64be)[..20]
    /// ```
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CONTRACT_ADDRESS_DOMAIN);
        hasher.update(&deployer.0);
        hasher.update(&nonce.to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Lower-case `0x`-prefixed hex form
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(stripped).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(AddressParseError::InvalidLength(bytes.len()));
        }

        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_low_u64(1).is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn test_hex_display_and_parse() {
        let addr = Address::from_low_u64(0xabcdef);
        let text = addr.to_string();
        assert_eq!(text, "0x0000000000000000000000000000000000abcdef");
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        assert_eq!("0X0000000000000000000000000000000000ABCDEF".parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!("0x1234".parse::<Address>(), Err(AddressParseError::InvalidLength(2))));
        assert!(matches!("0xzz".parse::<Address>(), Err(AddressParseError::InvalidHex(_))));
    }

    #[test]
    fn test_contract_address_derivation() {
        let deployer = Address::from_low_u64(7);

        let first = Address::derive_contract(&deployer, 0);
        let again = Address::derive_contract(&deployer, 0);
        let second = Address::derive_contract(&deployer, 1);
        let other = Address::derive_contract(&Address::from_low_u64(8), 0);

        assert_eq!(first, again);
        assert_ne!(first, second);
        assert_ne!(first, other);
        assert!(!first.is_zero());
    }
}
