//! Cross-contract read dispatch
//!
//! The resolver never touches factory or TLD storage directly. It walks the
//! deployed contracts through these capabilities, looked up by address.

use super::metadata::MetadataProvider;
use crate::types::{Address, TokenId};

/// A contract that knows a set of TLD names and where they are deployed
pub trait TldSource {
    /// Contract address for `name`, `Address::ZERO` if unknown
    fn resolve_name(&self, name: &str) -> Address;

    /// Known TLD names in creation order
    fn list_names(&self) -> Vec<String>;
}

/// Read surface of one TLD registry
pub trait TldReader {
    fn name(&self) -> &str;
    fn symbol(&self) -> &str;

    /// Holder of `domain_name`, `Address::ZERO` if unminted
    fn get_domain_holder(&self, domain_name: &str) -> Address;

    fn domain_token_id(&self, domain_name: &str) -> Option<TokenId>;

    /// Domain name for `token_id`, empty if unminted
    fn domain_ids_names(&self, token_id: TokenId) -> String;

    /// Current NFT owner, `Address::ZERO` if unminted
    fn token_owner(&self, token_id: TokenId) -> Address;

    /// Stored default domain for `holder`, empty if none
    fn default_names(&self, holder: &Address) -> String;

    /// Free-form data attached to `domain_name`, empty if none
    fn domain_data(&self, domain_name: &str) -> String;

    fn metadata_address(&self) -> Address;

    /// Token URI rendered by `provider`, empty if unminted
    fn token_uri(&self, token_id: TokenId, provider: &dyn MetadataProvider) -> String;
}

/// Address book of deployed contracts, as seen by a reader
pub trait ContractDirectory {
    fn tld_source(&self, address: &Address) -> Option<&dyn TldSource>;
    fn tld(&self, address: &Address) -> Option<&dyn TldReader>;
    fn metadata_provider(&self, address: &Address) -> Option<&dyn MetadataProvider>;
}
