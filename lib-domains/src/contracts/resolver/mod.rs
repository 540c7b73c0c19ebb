//! Resolver
//!
//! Read-side aggregation over a curated list of factories and, through them,
//! every TLD registry they created. The resolver owns only three pieces of
//! state: the factory list, the deprecated-TLD overlay and per-holder custom
//! default overrides. Everything else is read through [`ContractDirectory`]
//! at query time.
//!
//! # Invariants
//! - Deprecated TLD addresses never resolve, from any read path
//! - The deprecated set is append-only
//! - A custom override, or a per-TLD default, is only reported while its
//!   domain is still held by the queried account

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::access::Managed;
use super::directory::{ContractDirectory, TldReader};
use super::events::DomainEvent;
use super::executor::ExecutionContext;
use super::storage::Registry;
use super::tld::normalize_domain_name;
use crate::config::ResolverConfig;
use crate::errors::{ContractError, ContractResult};
use crate::types::Address;


/// A holder's resolver-level choice of primary domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDefault {
    pub domain_name: String,
    pub tld_name: String,
}

/// One resolvable TLD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TldEntry {
    pub name: String,
    pub tld_address: Address,
    pub factory_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolver {
    managed: Managed,
    /// Factory → block it was registered in
    factories: Registry<Address, u64>,
    /// Deprecated TLD address → block it was deprecated in
    deprecated: Registry<Address, u64>,
    custom_defaults: BTreeMap<Address, CustomDefault>,
    max_page_size: usize,
}

impl Resolver {
    pub fn new(owner: Address, config: &ResolverConfig) -> Self {
        Self {
            managed: Managed::new(owner),
            factories: Registry::new(),
            deprecated: Registry::new(),
            custom_defaults: BTreeMap::new(),
            max_page_size: config.max_page_size,
        }
    }

    pub fn owner(&self) -> Address {
        self.managed.owner()
    }

    pub fn is_manager(&self, account: &Address) -> bool {
        self.managed.is_manager(account)
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Registered factories in registration order
    pub fn get_factories(&self) -> Vec<Address> {
        self.factories.keys().to_vec()
    }

    pub fn is_tld_deprecated(&self, tld_address: &Address) -> bool {
        self.deprecated.exists(tld_address)
    }

    pub fn deprecated_tlds(&self) -> &[Address] {
        self.deprecated.keys()
    }

    pub fn get_custom_default_domain(&self, holder: &Address) -> Option<&CustomDefault> {
        self.custom_defaults.get(holder)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn add_manager(&mut self, ctx: &mut ExecutionContext, manager: Address) -> ContractResult<()> {
        self.managed.add_manager(ctx, manager)
    }

    pub fn remove_manager(&mut self, ctx: &mut ExecutionContext, manager: Address) -> ContractResult<()> {
        self.managed.remove_manager(ctx, manager)
    }

    pub fn transfer_ownership(&mut self, ctx: &mut ExecutionContext, new_owner: Address) -> ContractResult<()> {
        self.managed.ownable_mut().transfer_ownership(ctx, new_owner)
    }

    pub fn add_factory_address(&mut self, ctx: &mut ExecutionContext, factory: Address) -> ContractResult<()> {
        self.managed.only_operator(ctx)?;
        if factory.is_zero() {
            return Err(ContractError::ZeroAddress);
        }
        if self.factories.exists(&factory) {
            return Err(ContractError::FactoryAlreadyAdded(factory));
        }

        self.factories.put(factory, ctx.block_number);
        tracing::info!("Resolver now scanning factory {}", factory);
        ctx.emit(DomainEvent::ResolverFactoryAdded { factory });
        Ok(())
    }

    pub fn remove_factory_address(&mut self, ctx: &mut ExecutionContext, factory: Address) -> ContractResult<()> {
        self.managed.only_operator(ctx)?;
        if self.factories.remove(&factory).is_none() {
            return Err(ContractError::FactoryNotRegistered(factory));
        }

        tracing::info!("Resolver stopped scanning factory {}", factory);
        ctx.emit(DomainEvent::ResolverFactoryRemoved { factory });
        Ok(())
    }

    /// Hide a TLD from every resolver read. The TLD contract itself is
    /// untouched. There is no way back; deprecating twice is a no-op and
    /// emits nothing.
    pub fn add_deprecated_tld_address(&mut self, ctx: &mut ExecutionContext, tld_address: Address) -> ContractResult<()> {
        self.managed.only_operator(ctx)?;
        if self.deprecated.exists(&tld_address) {
            return Ok(());
        }

        self.deprecated.put(tld_address, ctx.block_number);
        tracing::info!("Deprecated TLD {}", tld_address);
        ctx.emit(DomainEvent::TldDeprecated { tld_address });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Custom default override
    // ------------------------------------------------------------------

    /// Pick the caller's single primary domain across all TLDs
    pub fn set_custom_default_domain(
        &mut self,
        ctx: &mut ExecutionContext,
        dir: &dyn ContractDirectory,
        domain_name: &str,
        tld_name: &str,
    ) -> ContractResult<()> {
        let holder = self.get_domain_holder(dir, domain_name, tld_name);
        if holder.is_zero() || holder != ctx.caller {
            return Err(ContractError::SenderNotDomainHolder);
        }

        let domain_name = normalize_domain_name(domain_name);
        self.custom_defaults.insert(
            ctx.caller,
            CustomDefault {
                domain_name: domain_name.clone(),
                tld_name: tld_name.to_string(),
            },
        );
        tracing::info!("Custom default for {} set to {}{}", ctx.caller, domain_name, tld_name);
        ctx.emit(DomainEvent::CustomDefaultDomainSet {
            user: ctx.caller,
            domain_name,
            tld_name: tld_name.to_string(),
        });
        Ok(())
    }

    pub fn clear_custom_default_domain(&mut self, ctx: &mut ExecutionContext) -> ContractResult<()> {
        if self.custom_defaults.remove(&ctx.caller).is_some() {
            ctx.emit(DomainEvent::CustomDefaultDomainCleared { user: ctx.caller });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // TLD resolution
    // ------------------------------------------------------------------

    /// Contract address of `tld_name`, `Address::ZERO` if unknown or deprecated
    pub fn get_tld_address(&self, dir: &dyn ContractDirectory, tld_name: &str) -> Address {
        self.find_tld(dir, tld_name)
            .map(|(_, tld_address)| tld_address)
            .unwrap_or(Address::ZERO)
    }

    /// Factory that created `tld_name`, `Address::ZERO` if unknown or deprecated
    pub fn get_tld_factory_address(&self, dir: &dyn ContractDirectory, tld_name: &str) -> Address {
        self.find_tld(dir, tld_name)
            .map(|(factory, _)| factory)
            .unwrap_or(Address::ZERO)
    }

    /// Every resolvable TLD, factory by factory in creation order
    pub fn get_tlds(&self, dir: &dyn ContractDirectory) -> Vec<TldEntry> {
        self.active_tlds(dir).collect()
    }

    /// Page of [`Resolver::get_tlds`]; `limit` is capped at `max_page_size`
    pub fn get_tlds_page(&self, dir: &dyn ContractDirectory, offset: usize, limit: usize) -> Vec<TldEntry> {
        self.active_tlds(dir)
            .skip(offset)
            .take(limit.min(self.max_page_size))
            .collect()
    }

    // ------------------------------------------------------------------
    // Domain reads
    // ------------------------------------------------------------------

    pub fn get_domain_holder(&self, dir: &dyn ContractDirectory, domain_name: &str, tld_name: &str) -> Address {
        self.resolve_tld(dir, tld_name)
            .map(|tld| tld.get_domain_holder(domain_name))
            .unwrap_or(Address::ZERO)
    }

    pub fn get_domain_token_uri(&self, dir: &dyn ContractDirectory, domain_name: &str, tld_name: &str) -> String {
        let Some(tld) = self.resolve_tld(dir, tld_name) else {
            return String::new();
        };
        let Some(token_id) = tld.domain_token_id(domain_name) else {
            return String::new();
        };
        match dir.metadata_provider(&tld.metadata_address()) {
            Some(provider) => tld.token_uri(token_id, provider),
            None => {
                tracing::debug!("No metadata provider at {} for {}", tld.metadata_address(), tld_name);
                String::new()
            }
        }
    }

    pub fn get_domain_data(&self, dir: &dyn ContractDirectory, domain_name: &str, tld_name: &str) -> String {
        self.resolve_tld(dir, tld_name)
            .map(|tld| tld.domain_data(domain_name))
            .unwrap_or_default()
    }

    /// `holder`'s default domain in `tld_name`, without the suffix
    pub fn get_default_domain(&self, dir: &dyn ContractDirectory, holder: &Address, tld_name: &str) -> String {
        self.resolve_tld(dir, tld_name)
            .map(|tld| held_default(tld, holder))
            .unwrap_or_default()
    }

    /// `holder`'s single primary domain, suffix included
    ///
    /// A custom override wins while the holder still holds it through a
    /// non-deprecated TLD; otherwise the first per-TLD default in
    /// registration order.
    pub fn get_first_default_domain(&self, dir: &dyn ContractDirectory, holder: &Address) -> String {
        if let Some(custom) = self.custom_defaults.get(holder) {
            if self.get_domain_holder(dir, &custom.domain_name, &custom.tld_name) == *holder {
                return format!("{}{}", custom.domain_name, custom.tld_name);
            }
            tracing::debug!(
                "Ignoring stale custom default {}{} for {}",
                custom.domain_name,
                custom.tld_name,
                holder
            );
        }

        self.active_tlds(dir)
            .find_map(|entry| {
                let tld = dir.tld(&entry.tld_address)?;
                let name = held_default(tld, holder);
                (!name.is_empty()).then(|| format!("{}{}", name, entry.name))
            })
            .unwrap_or_default()
    }

    /// Every per-TLD default of `holder`, suffix included
    pub fn get_default_domains(&self, dir: &dyn ContractDirectory, holder: &Address) -> Vec<String> {
        self.active_tlds(dir)
            .filter_map(|entry| {
                let tld = dir.tld(&entry.tld_address)?;
                let name = held_default(tld, holder);
                (!name.is_empty()).then(|| format!("{}{}", name, entry.name))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    /// First (factory, tld address) for `tld_name`, skipping deprecated matches
    fn find_tld(&self, dir: &dyn ContractDirectory, tld_name: &str) -> Option<(Address, Address)> {
        self.factories.keys().iter().find_map(|factory| {
            let source = dir.tld_source(factory)?;
            let tld_address = source.resolve_name(tld_name);
            if tld_address.is_zero() {
                return None;
            }
            if self.is_tld_deprecated(&tld_address) {
                tracing::debug!("Skipping deprecated {} at {}", tld_name, tld_address);
                return None;
            }
            Some((*factory, tld_address))
        })
    }

    fn resolve_tld<'a>(&self, dir: &'a dyn ContractDirectory, tld_name: &str) -> Option<&'a dyn TldReader> {
        let (_, tld_address) = self.find_tld(dir, tld_name)?;
        dir.tld(&tld_address)
    }

    fn active_tlds<'a>(&'a self, dir: &'a dyn ContractDirectory) -> impl Iterator<Item = TldEntry> + 'a {
        self.factories
            .keys()
            .iter()
            .filter_map(move |factory| dir.tld_source(factory).map(|source| (*factory, source)))
            .flat_map(|(factory_address, source)| {
                source.list_names().into_iter().map(move |name| TldEntry {
                    tld_address: source.resolve_name(&name),
                    name,
                    factory_address,
                })
            })
            .filter(move |entry| !entry.tld_address.is_zero() && !self.is_tld_deprecated(&entry.tld_address))
    }
}

/// Stored default of `holder`, if they still hold it
fn held_default(tld: &dyn TldReader, holder: &Address) -> String {
    let name = tld.default_names(holder);
    if name.is_empty() || tld.get_domain_holder(&name) != *holder {
        return String::new();
    }
    name
}
