//! TLD Factory
//!
//! Deploys TLD registries and keeps the canonical name → contract index for
//! everything it created. Every created name is also pushed into the shared
//! forbidden-name registry, so no other factory sharing that registry can
//! create it again.

pub mod validation;


use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::access::Ownable;
use super::directory::TldSource;
use super::events::DomainEvent;
use super::executor::ExecutionContext;
use super::forbidden::ForbiddenTldRegistry;
use super::storage::Registry;
use super::tld::{TldRegistry, TldRegistryParams};
use crate::config::RegistryConfig;
use crate::errors::{ContractError, ContractResult};
use crate::types::{Address, TokenId, Wei, MAX_ROYALTY_BPS};

pub use validation::validate_tld_name;

/// Arguments of a TLD creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldParams {
    pub name: String,
    pub symbol: String,
    pub tld_owner: Address,
    /// Price of one domain in the new TLD
    pub domain_price: Wei,
    pub buying_enabled: bool,
}

impl TldParams {
    pub fn new(name: &str, symbol: &str, tld_owner: Address, domain_price: Wei, buying_enabled: bool) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            tld_owner,
            domain_price,
            buying_enabled,
        }
    }
}

/// Immutable record of one created TLD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldRecord {
    pub name: String,
    pub contract_address: Address,
    pub factory_address: Address,
}

/// A freshly created TLD registry, ready to be installed at its address
#[derive(Debug, Clone)]
pub struct DeployedTld {
    pub record: TldRecord,
    pub registry: TldRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldFactory {
    address: Address,
    ownable: Ownable,
    price: Wei,
    buying_enabled: bool,
    royalty_bps: u16,
    forbidden_address: Address,
    metadata_address: Address,
    tld_min_length: usize,
    tld_max_length: usize,
    name_max_length: usize,
    first_token_id: TokenId,
    /// Contracts deployed so far; seeds the next TLD address
    deploy_nonce: u64,
    tld_names_addresses: Registry<String, TldRecord>,
    tld_addresses: BTreeSet<Address>,
    collected: Wei,
}

impl TldFactory {
    pub fn new(
        address: Address,
        owner: Address,
        price: Wei,
        forbidden_address: Address,
        metadata_address: Address,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            address,
            ownable: Ownable::new(owner),
            price,
            buying_enabled: false,
            royalty_bps: config.factory.default_royalty_bps,
            forbidden_address,
            metadata_address,
            tld_min_length: config.factory.tld_min_length,
            tld_max_length: config.factory.tld_max_length,
            name_max_length: config.tld.name_max_length,
            first_token_id: config.tld.first_token_id,
            deploy_nonce: 0,
            tld_names_addresses: Registry::new(),
            tld_addresses: BTreeSet::new(),
            collected: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn price(&self) -> Wei {
        self.price
    }

    pub fn buying_enabled(&self) -> bool {
        self.buying_enabled
    }

    pub fn royalty_bps(&self) -> u16 {
        self.royalty_bps
    }

    pub fn forbidden_address(&self) -> Address {
        self.forbidden_address
    }

    pub fn metadata_address(&self) -> Address {
        self.metadata_address
    }

    pub fn collected(&self) -> Wei {
        self.collected
    }

    /// Contract address of `name`, `Address::ZERO` if this factory never created it
    pub fn tld_names_addresses(&self, name: &str) -> Address {
        self.tld_record(name)
            .map(|record| record.contract_address)
            .unwrap_or(Address::ZERO)
    }

    pub fn tld_address_exists(&self, address: &Address) -> bool {
        self.tld_addresses.contains(address)
    }

    pub fn tld_record(&self, name: &str) -> Option<&TldRecord> {
        self.tld_names_addresses.get(&name.to_string())
    }

    /// Created TLD names in creation order
    pub fn tlds(&self) -> &[String] {
        self.tld_names_addresses.keys()
    }

    /// Create a TLD as a paying customer
    pub fn create_tld(
        &mut self,
        ctx: &mut ExecutionContext,
        forbidden: &mut dyn ForbiddenTldRegistry,
        params: TldParams,
    ) -> ContractResult<DeployedTld> {
        // ===== VALIDATION PHASE =====
        // The owner skips the buying flag and the price.
        if !self.ownable.is_owner(&ctx.caller) {
            if !self.buying_enabled {
                return Err(ContractError::BuyingTldsDisabled);
            }
            if ctx.value < self.price {
                return Err(ContractError::ValueBelowPrice {
                    price: self.price,
                    paid: ctx.value,
                });
            }
        }

        self.deploy(ctx, forbidden, params)
    }

    /// Create a TLD without payment or the buying flag; owner only
    pub fn owner_create_tld(
        &mut self,
        ctx: &mut ExecutionContext,
        forbidden: &mut dyn ForbiddenTldRegistry,
        params: TldParams,
    ) -> ContractResult<DeployedTld> {
        self.ownable.only_owner(ctx)?;
        self.deploy(ctx, forbidden, params)
    }

    pub fn toggle_buying_tlds(&mut self, ctx: &mut ExecutionContext) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.buying_enabled = !self.buying_enabled;
        self.emit_setting(ctx, "buying_enabled", self.buying_enabled.to_string());
        Ok(())
    }

    pub fn change_price(&mut self, ctx: &mut ExecutionContext, price: Wei) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.price = price;
        self.emit_setting(ctx, "price", price.to_string());
        Ok(())
    }

    /// Royalty applied to TLDs created from now on
    pub fn change_royalty(&mut self, ctx: &mut ExecutionContext, royalty_bps: u16) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        if royalty_bps > MAX_ROYALTY_BPS {
            return Err(ContractError::RoyaltyTooHigh { bps: royalty_bps });
        }
        self.royalty_bps = royalty_bps;
        self.emit_setting(ctx, "royalty_bps", royalty_bps.to_string());
        Ok(())
    }

    pub fn transfer_ownership(&mut self, ctx: &mut ExecutionContext, new_owner: Address) -> ContractResult<()> {
        self.ownable.transfer_ownership(ctx, new_owner)
    }

    fn deploy(
        &mut self,
        ctx: &mut ExecutionContext,
        forbidden: &mut dyn ForbiddenTldRegistry,
        params: TldParams,
    ) -> ContractResult<DeployedTld> {
        validate_tld_name(&params.name, self.tld_min_length, self.tld_max_length)?;
        if self.tld_names_addresses.exists(&params.name) {
            return Err(ContractError::TldAlreadyExists { name: params.name });
        }
        if forbidden.is_forbidden(&params.name) {
            return Err(ContractError::TldForbidden { name: params.name });
        }

        // ===== MUTATION PHASE =====
        ctx.call_contract(self.forbidden_address, |inner| {
            forbidden.add_forbidden_tld(inner, &params.name)
        })?;

        let tld_address = Address::derive_contract(&self.address, self.deploy_nonce);
        self.deploy_nonce += 1;

        let registry = TldRegistry::new(TldRegistryParams {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            owner: params.tld_owner,
            price: params.domain_price,
            buying_enabled: params.buying_enabled,
            royalty_bps: self.royalty_bps,
            factory_address: self.address,
            royalty_fee_updater: self.ownable.owner(),
            metadata_address: self.metadata_address,
            name_max_length: self.name_max_length,
            first_token_id: self.first_token_id,
        });
        let record = TldRecord {
            name: params.name.clone(),
            contract_address: tld_address,
            factory_address: self.address,
        };

        self.tld_names_addresses.put(params.name.clone(), record.clone());
        self.tld_addresses.insert(tld_address);
        self.collected = self.collected.saturating_add(ctx.value);

        tracing::info!(
            "Created TLD {} at {} for owner {} (paid {})",
            params.name,
            tld_address,
            params.tld_owner,
            ctx.value
        );
        ctx.emit(DomainEvent::TldCreated {
            creator: ctx.caller,
            tld_owner: params.tld_owner,
            name: params.name,
            tld_address,
            paid: ctx.value,
        });

        Ok(DeployedTld { record, registry })
    }

    fn emit_setting(&self, ctx: &mut ExecutionContext, setting: &str, value: String) {
        tracing::info!("Factory {} setting {} changed to {}", self.address, setting, value);
        ctx.emit(DomainEvent::FactorySettingChanged {
            setting: setting.to_string(),
            value,
        });
    }
}

impl TldSource for TldFactory {
    fn resolve_name(&self, name: &str) -> Address {
        self.tld_names_addresses(name)
    }

    fn list_names(&self) -> Vec<String> {
        self.tlds().to_vec()
    }
}
