//! TLD Registry
//!
//! One NFT collection per TLD. Each token is a domain name under the TLD;
//! the registry keeps name → domain, token id → name, and a per-holder
//! default domain.
//!
//! # Invariants
//! - A domain's `holder` is the NFT owner of its token; ownership is stored
//!   once, on the domain record, so the two cannot diverge
//! - Token ids are assigned sequentially and never reused
//! - A holder's default name always refers to a domain that holder owns:
//!   transfers and burns clear a default pointing at the moved domain

pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::access::Ownable;
use super::directory::TldReader;
use super::events::DomainEvent;
use super::executor::ExecutionContext;
use super::metadata::MetadataProvider;
use super::storage::Registry;
use crate::errors::{ContractError, ContractResult};
use crate::types::{Address, TokenId, Wei, BPS_DENOMINATOR, MAX_ROYALTY_BPS};

pub use types::{normalize_domain_name, Domain, TldRegistryParams};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldRegistry {
    name: String,
    symbol: String,
    ownable: Ownable,
    factory_address: Address,
    minter: Address,
    price: Wei,
    buying_enabled: bool,
    royalty_bps: u16,
    royalty_fee_updater: Address,
    royalty_fee_receiver: Address,
    metadata_address: Address,
    metadata_frozen: bool,
    name_max_length: usize,
    next_token_id: TokenId,
    total_supply: u64,
    /// Mint payments received
    collected: Wei,
    domains: Registry<String, Domain>,
    domain_ids_names: BTreeMap<TokenId, String>,
    balances: BTreeMap<Address, u64>,
    token_approvals: BTreeMap<TokenId, Address>,
    /// (owner, operator) pairs
    operator_approvals: BTreeSet<(Address, Address)>,
    default_names: BTreeMap<Address, String>,
}

impl TldRegistry {
    pub fn new(params: TldRegistryParams) -> Self {
        Self {
            name: params.name,
            symbol: params.symbol,
            ownable: Ownable::new(params.owner),
            factory_address: params.factory_address,
            minter: Address::ZERO,
            price: params.price,
            buying_enabled: params.buying_enabled,
            royalty_bps: params.royalty_bps,
            royalty_fee_updater: params.royalty_fee_updater,
            royalty_fee_receiver: params.royalty_fee_updater,
            metadata_address: params.metadata_address,
            metadata_frozen: false,
            name_max_length: params.name_max_length,
            next_token_id: params.first_token_id,
            total_supply: 0,
            collected: 0,
            domains: Registry::new(),
            domain_ids_names: BTreeMap::new(),
            balances: BTreeMap::new(),
            token_approvals: BTreeMap::new(),
            operator_approvals: BTreeSet::new(),
            default_names: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn factory_address(&self) -> Address {
        self.factory_address
    }

    pub fn minter(&self) -> Address {
        self.minter
    }

    pub fn price(&self) -> Wei {
        self.price
    }

    pub fn buying_enabled(&self) -> bool {
        self.buying_enabled
    }

    pub fn metadata_address(&self) -> Address {
        self.metadata_address
    }

    pub fn metadata_frozen(&self) -> bool {
        self.metadata_frozen
    }

    pub fn name_max_length(&self) -> usize {
        self.name_max_length
    }

    pub fn royalty_bps(&self) -> u16 {
        self.royalty_bps
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn collected(&self) -> Wei {
        self.collected
    }

    pub fn get_domain(&self, domain_name: &str) -> Option<&Domain> {
        self.domains.get(&normalize_domain_name(domain_name))
    }

    pub fn get_domain_holder(&self, domain_name: &str) -> Address {
        self.get_domain(domain_name)
            .map(|domain| domain.holder)
            .unwrap_or(Address::ZERO)
    }

    pub fn domain_ids_names(&self, token_id: TokenId) -> String {
        self.domain_ids_names.get(&token_id).cloned().unwrap_or_default()
    }

    pub fn token_id_of(&self, domain_name: &str) -> Option<TokenId> {
        self.get_domain(domain_name).map(|domain| domain.token_id)
    }

    pub fn default_names(&self, holder: &Address) -> String {
        self.default_names.get(holder).cloned().unwrap_or_default()
    }

    pub fn owner_of(&self, token_id: TokenId) -> ContractResult<Address> {
        self.minted(token_id).map(|domain| domain.holder)
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn get_approved(&self, token_id: TokenId) -> ContractResult<Address> {
        self.minted(token_id)?;
        Ok(self.token_approvals.get(&token_id).copied().unwrap_or(Address::ZERO))
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operator_approvals.contains(&(*owner, *operator))
    }

    /// Royalty receiver and amount owed on a sale at `sale_price`
    pub fn royalty_info(&self, sale_price: Wei) -> (Address, Wei) {
        let amount = sale_price.saturating_mul(self.royalty_bps as u128) / BPS_DENOMINATOR;
        (self.royalty_fee_receiver, amount)
    }

    pub fn token_uri(&self, token_id: TokenId, provider: &dyn MetadataProvider) -> ContractResult<String> {
        let domain = self.minted(token_id)?;
        Ok(provider.get_metadata(&domain.name, &self.name, token_id))
    }

    /// Domains in mint order
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.iter().map(|(_, domain)| domain)
    }

    // ------------------------------------------------------------------
    // Domain lifecycle
    // ------------------------------------------------------------------

    /// Mint `domain_name` to `holder`
    ///
    /// Open to anyone paying at least `price` while buying is enabled; the
    /// owner and the minter may mint at any time without payment. The first
    /// domain a holder receives becomes their default.
    pub fn mint(
        &mut self,
        ctx: &mut ExecutionContext,
        domain_name: &str,
        holder: Address,
        referrer: Address,
    ) -> ContractResult<TokenId> {
        // ===== VALIDATION PHASE =====
        let privileged = self.ownable.is_owner(&ctx.caller) || (!self.minter.is_zero() && self.minter == ctx.caller);
        if !privileged {
            if !self.buying_enabled {
                return Err(ContractError::BuyingDomainsDisabled);
            }
            if ctx.value < self.price {
                return Err(ContractError::ValueBelowPrice {
                    price: self.price,
                    paid: ctx.value,
                });
            }
        }
        if holder.is_zero() {
            return Err(ContractError::MintToZeroAddress);
        }

        let name = normalize_domain_name(domain_name);
        self.validate_domain_name(&name)?;
        if self.domains.exists(&name) {
            return Err(ContractError::DomainAlreadyExists { name });
        }

        // ===== MUTATION PHASE =====
        let token_id = self.next_token_id;
        self.next_token_id += 1;
        self.total_supply += 1;
        self.collected = self.collected.saturating_add(ctx.value);

        self.domains.put(
            name.clone(),
            Domain {
                name: name.clone(),
                token_id,
                holder,
                data: String::new(),
            },
        );
        self.domain_ids_names.insert(token_id, name.clone());
        *self.balances.entry(holder).or_insert(0) += 1;

        ctx.emit(DomainEvent::Transfer {
            from: Address::ZERO,
            to: holder,
            token_id,
        });
        self.adopt_default_if_unset(ctx, holder, &name);

        let full_name = format!("{}{}", name, self.name);
        tracing::info!("Minted {} (token {}) to {}", full_name, token_id, holder);
        ctx.emit(DomainEvent::DomainCreated {
            minter: ctx.caller,
            holder,
            full_name,
            token_id,
            referrer,
        });

        Ok(token_id)
    }

    /// Burn a domain; only its holder may do this
    pub fn burn(&mut self, ctx: &mut ExecutionContext, domain_name: &str) -> ContractResult<()> {
        let name = normalize_domain_name(domain_name);
        let domain = self
            .domains
            .get(&name)
            .filter(|domain| domain.holder == ctx.caller)
            .cloned()
            .ok_or_else(|| ContractError::NotDomainHolder { name: name.clone() })?;

        self.domains.remove(&name);
        self.domain_ids_names.remove(&domain.token_id);
        self.token_approvals.remove(&domain.token_id);
        self.decrement_balance(&domain.holder);
        self.total_supply -= 1;
        self.clear_default_if_pointing(ctx, domain.holder, &name);

        ctx.emit(DomainEvent::Transfer {
            from: domain.holder,
            to: Address::ZERO,
            token_id: domain.token_id,
        });
        ctx.emit(DomainEvent::DomainBurned {
            holder: domain.holder,
            full_name: format!("{}{}", name, self.name),
        });
        tracing::info!("Burned {}{} (token {})", name, self.name, domain.token_id);
        Ok(())
    }

    /// Make `domain_name` the caller's default domain in this TLD
    pub fn edit_default_domain(&mut self, ctx: &mut ExecutionContext, domain_name: &str) -> ContractResult<()> {
        let name = normalize_domain_name(domain_name);
        self.require_holder(ctx, &name)?;

        self.default_names.insert(ctx.caller, name.clone());
        ctx.emit(DomainEvent::DefaultDomainChanged {
            user: ctx.caller,
            default_domain: name,
        });
        Ok(())
    }

    pub fn edit_data(&mut self, ctx: &mut ExecutionContext, domain_name: &str, data: &str) -> ContractResult<()> {
        let name = normalize_domain_name(domain_name);
        self.require_holder(ctx, &name)?;

        if let Some(domain) = self.domains.get_mut(&name) {
            domain.data = data.to_string();
        }
        ctx.emit(DomainEvent::DataChanged {
            user: ctx.caller,
            domain: name,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // NFT ownership
    // ------------------------------------------------------------------

    pub fn approve(&mut self, ctx: &mut ExecutionContext, to: Address, token_id: TokenId) -> ContractResult<()> {
        let owner = self.owner_of(token_id)?;
        if to == owner {
            return Err(ContractError::ApprovalToCurrentOwner);
        }
        if ctx.caller != owner && !self.is_approved_for_all(&owner, &ctx.caller) {
            return Err(ContractError::NotOwnerNorApproved);
        }

        if to.is_zero() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, to);
        }
        ctx.emit(DomainEvent::Approval {
            owner,
            approved: to,
            token_id,
        });
        Ok(())
    }

    pub fn set_approval_for_all(
        &mut self,
        ctx: &mut ExecutionContext,
        operator: Address,
        approved: bool,
    ) -> ContractResult<()> {
        let owner = ctx.caller;
        if operator == owner {
            return Err(ContractError::ApproveToCaller);
        }

        if approved {
            self.operator_approvals.insert((owner, operator));
        } else {
            self.operator_approvals.remove(&(owner, operator));
        }
        ctx.emit(DomainEvent::ApprovalForAll {
            owner,
            operator,
            approved,
        });
        Ok(())
    }

    /// Move `token_id` from `from` to `to`
    ///
    /// The holder index follows the token, the sender loses the default if
    /// it pointed at this domain, and the recipient adopts it as default
    /// when they have none.
    pub fn transfer_from(
        &mut self,
        ctx: &mut ExecutionContext,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> ContractResult<()> {
        // ===== VALIDATION PHASE =====
        let owner = self.owner_of(token_id)?;
        if !self.is_approved_or_owner(&ctx.caller, &owner, token_id) {
            return Err(ContractError::NotOwnerNorApproved);
        }
        if owner != from {
            return Err(ContractError::TransferFromIncorrectOwner);
        }
        if to.is_zero() {
            return Err(ContractError::TransferToZeroAddress);
        }

        // ===== MUTATION PHASE =====
        let name = self.domain_ids_names(token_id);
        self.token_approvals.remove(&token_id);
        self.decrement_balance(&from);
        *self.balances.entry(to).or_insert(0) += 1;
        if let Some(domain) = self.domains.get_mut(&name) {
            domain.holder = to;
            domain.data.clear();
        }

        ctx.emit(DomainEvent::Transfer { from, to, token_id });
        self.clear_default_if_pointing(ctx, from, &name);
        self.adopt_default_if_unset(ctx, to, &name);

        tracing::info!("Transferred {}{} from {} to {}", name, self.name, from, to);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Owner administration
    // ------------------------------------------------------------------

    pub fn change_price(&mut self, ctx: &mut ExecutionContext, price: Wei) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.price = price;
        self.emit_setting(ctx, "price", price.to_string());
        Ok(())
    }

    pub fn toggle_buying_domains(&mut self, ctx: &mut ExecutionContext) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.buying_enabled = !self.buying_enabled;
        self.emit_setting(ctx, "buying_enabled", self.buying_enabled.to_string());
        Ok(())
    }

    pub fn change_minter(&mut self, ctx: &mut ExecutionContext, minter: Address) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.minter = minter;
        self.emit_setting(ctx, "minter", minter.to_string());
        Ok(())
    }

    pub fn change_name_max_length(&mut self, ctx: &mut ExecutionContext, max_length: usize) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.name_max_length = max_length;
        self.emit_setting(ctx, "name_max_length", max_length.to_string());
        Ok(())
    }

    pub fn change_metadata_address(&mut self, ctx: &mut ExecutionContext, metadata: Address) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        if self.metadata_frozen {
            return Err(ContractError::MetadataFrozen);
        }
        self.metadata_address = metadata;
        self.emit_setting(ctx, "metadata_address", metadata.to_string());
        Ok(())
    }

    /// Permanently lock the metadata address
    pub fn freeze_metadata(&mut self, ctx: &mut ExecutionContext) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.metadata_frozen = true;
        self.emit_setting(ctx, "metadata_frozen", "true".to_string());
        Ok(())
    }

    pub fn change_royalty(&mut self, ctx: &mut ExecutionContext, royalty_bps: u16) -> ContractResult<()> {
        self.only_royalty_fee_updater(ctx)?;
        if royalty_bps > MAX_ROYALTY_BPS {
            return Err(ContractError::RoyaltyTooHigh { bps: royalty_bps });
        }
        self.royalty_bps = royalty_bps;
        self.emit_setting(ctx, "royalty_bps", royalty_bps.to_string());
        Ok(())
    }

    pub fn change_royalty_fee_receiver(&mut self, ctx: &mut ExecutionContext, receiver: Address) -> ContractResult<()> {
        self.only_royalty_fee_updater(ctx)?;
        self.royalty_fee_receiver = receiver;
        self.emit_setting(ctx, "royalty_fee_receiver", receiver.to_string());
        Ok(())
    }

    pub fn transfer_ownership(&mut self, ctx: &mut ExecutionContext, new_owner: Address) -> ContractResult<()> {
        self.ownable.transfer_ownership(ctx, new_owner)
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    fn validate_domain_name(&self, name: &str) -> ContractResult<()> {
        if name.is_empty() {
            return Err(ContractError::DomainNameEmpty);
        }
        if name.len() >= self.name_max_length {
            return Err(ContractError::DomainNameTooLong {
                max: self.name_max_length,
                actual: name.len(),
            });
        }
        if name.contains('.') {
            return Err(ContractError::DomainNameHasDot);
        }
        if name.contains(' ') {
            return Err(ContractError::DomainNameHasSpace);
        }
        Ok(())
    }

    fn minted(&self, token_id: TokenId) -> ContractResult<&Domain> {
        self.domain_ids_names
            .get(&token_id)
            .and_then(|name| self.domains.get(name))
            .ok_or(ContractError::InvalidTokenId(token_id))
    }

    fn require_holder(&self, ctx: &ExecutionContext, name: &str) -> ContractResult<()> {
        match self.domains.get(&name.to_string()) {
            Some(domain) if domain.holder == ctx.caller => Ok(()),
            _ => Err(ContractError::NotDomainHolder { name: name.to_string() }),
        }
    }

    fn is_approved_or_owner(&self, spender: &Address, owner: &Address, token_id: TokenId) -> bool {
        spender == owner
            || self.is_approved_for_all(owner, spender)
            || self.token_approvals.get(&token_id) == Some(spender)
    }

    fn only_royalty_fee_updater(&self, ctx: &ExecutionContext) -> ContractResult<()> {
        if ctx.caller == self.royalty_fee_updater {
            Ok(())
        } else {
            Err(ContractError::NotRoyaltyFeeUpdater)
        }
    }

    fn decrement_balance(&mut self, account: &Address) {
        if let Some(balance) = self.balances.get_mut(account) {
            *balance = balance.saturating_sub(1);
            if *balance == 0 {
                self.balances.remove(account);
            }
        }
    }

    fn adopt_default_if_unset(&mut self, ctx: &mut ExecutionContext, holder: Address, name: &str) {
        if self.default_names.contains_key(&holder) {
            return;
        }
        self.default_names.insert(holder, name.to_string());
        ctx.emit(DomainEvent::DefaultDomainChanged {
            user: holder,
            default_domain: name.to_string(),
        });
    }

    fn clear_default_if_pointing(&mut self, ctx: &mut ExecutionContext, holder: Address, name: &str) {
        if self.default_names.get(&holder).map(String::as_str) != Some(name) {
            return;
        }
        self.default_names.remove(&holder);
        ctx.emit(DomainEvent::DefaultDomainChanged {
            user: holder,
            default_domain: String::new(),
        });
    }

    fn emit_setting(&self, ctx: &mut ExecutionContext, setting: &str, value: String) {
        tracing::info!("TLD {} setting {} changed to {}", self.name, setting, value);
        ctx.emit(DomainEvent::TldSettingChanged {
            setting: setting.to_string(),
            value,
        });
    }
}

impl TldReader for TldRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn get_domain_holder(&self, domain_name: &str) -> Address {
        TldRegistry::get_domain_holder(self, domain_name)
    }

    fn domain_token_id(&self, domain_name: &str) -> Option<TokenId> {
        self.token_id_of(domain_name)
    }

    fn domain_ids_names(&self, token_id: TokenId) -> String {
        TldRegistry::domain_ids_names(self, token_id)
    }

    fn token_owner(&self, token_id: TokenId) -> Address {
        self.owner_of(token_id).unwrap_or(Address::ZERO)
    }

    fn default_names(&self, holder: &Address) -> String {
        TldRegistry::default_names(self, holder)
    }

    fn domain_data(&self, domain_name: &str) -> String {
        self.get_domain(domain_name)
            .map(|domain| domain.data.clone())
            .unwrap_or_default()
    }

    fn metadata_address(&self) -> Address {
        self.metadata_address
    }

    fn token_uri(&self, token_id: TokenId, provider: &dyn MetadataProvider) -> String {
        TldRegistry::token_uri(self, token_id, provider).unwrap_or_default()
    }
}
