//! TLD registry record types

use serde::{Deserialize, Serialize};

use crate::types::{Address, TokenId, Wei};

/// One minted domain. `name` carries no TLD suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub token_id: TokenId,
    pub holder: Address,
    /// Free-form data set by the holder (profile JSON, links, ...)
    pub data: String,
}

/// Constructor arguments for a TLD registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldRegistryParams {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub price: Wei,
    pub buying_enabled: bool,
    pub royalty_bps: u16,
    /// Factory that deployed this registry
    pub factory_address: Address,
    /// Account allowed to change royalty settings (the factory owner)
    pub royalty_fee_updater: Address,
    pub metadata_address: Address,
    pub name_max_length: usize,
    pub first_token_id: TokenId,
}

/// Normalized form a domain name is stored and looked up under
pub fn normalize_domain_name(name: &str) -> String {
    name.to_ascii_lowercase()
}
