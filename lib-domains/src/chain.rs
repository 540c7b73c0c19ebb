//! Domain Chain
//!
//! Hosts every deployed contract and executes calls against them as atomic
//! transactions. A transaction runs against a staged copy of the contract
//! state; the copy replaces live state (and its events are indexed) only if
//! the call succeeds, so a reverted call leaves nothing behind.
//!
//! Committed transactions are totally ordered: each one occupies the next
//! block.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::contracts::{
    ContractDirectory, EventIndexer, ExecutionContext, ForbiddenNameRegistry, InMemoryEventIndexer,
    MetadataProvider, Resolver, TldEntry, TldFactory, TldParams, TldReader, TldRegistry, TldSource,
};
use crate::errors::{ContractError, ContractResult};
use crate::snapshot::{ChainSnapshot, SnapshotResult};
use crate::types::{Address, TokenId, Wei};

/// Metadata providers are code, not state; they live beside the state
pub type ProviderMap = BTreeMap<Address, Arc<dyn MetadataProvider>>;

/// Every contract a resolver may read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contracts {
    pub forbidden: BTreeMap<Address, ForbiddenNameRegistry>,
    pub factories: BTreeMap<Address, TldFactory>,
    pub tlds: BTreeMap<Address, TldRegistry>,
    /// Addresses reserved for metadata providers
    pub metadata: BTreeSet<Address>,
}

impl Contracts {
    fn forbidden_mut(&mut self, address: &Address) -> ContractResult<&mut ForbiddenNameRegistry> {
        self.forbidden
            .get_mut(address)
            .ok_or(ContractError::UnknownContract(*address))
    }

    fn factory_mut(&mut self, address: &Address) -> ContractResult<&mut TldFactory> {
        self.factories
            .get_mut(address)
            .ok_or(ContractError::UnknownContract(*address))
    }

    fn tld_mut(&mut self, address: &Address) -> ContractResult<&mut TldRegistry> {
        self.tlds
            .get_mut(address)
            .ok_or(ContractError::UnknownContract(*address))
    }

    fn is_deployed(&self, address: &Address) -> bool {
        self.forbidden.contains_key(address)
            || self.factories.contains_key(address)
            || self.tlds.contains_key(address)
            || self.metadata.contains(address)
    }
}

/// Complete contract state of the chain
///
/// Resolvers are kept apart from the contracts they read so one can be
/// mutated while the rest are borrowed for reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    pub contracts: Contracts,
    pub resolvers: BTreeMap<Address, Resolver>,
    /// Deployments made per account, seeding contract addresses
    pub nonces: BTreeMap<Address, u64>,
}

impl ContractState {
    fn next_contract_address(&mut self, deployer: &Address) -> Address {
        let nonce = self.nonces.entry(*deployer).or_insert(0);
        let address = Address::derive_contract(deployer, *nonce);
        *nonce += 1;
        address
    }
}

/// Read-only directory over deployed contracts
#[derive(Debug, Clone, Copy)]
pub struct DirectoryView<'a> {
    contracts: &'a Contracts,
    providers: &'a ProviderMap,
}

impl<'a> DirectoryView<'a> {
    pub fn new(contracts: &'a Contracts, providers: &'a ProviderMap) -> Self {
        Self { contracts, providers }
    }
}

impl ContractDirectory for DirectoryView<'_> {
    fn tld_source(&self, address: &Address) -> Option<&dyn TldSource> {
        self.contracts
            .factories
            .get(address)
            .map(|factory| factory as &dyn TldSource)
    }

    fn tld(&self, address: &Address) -> Option<&dyn TldReader> {
        self.contracts.tlds.get(address).map(|tld| tld as &dyn TldReader)
    }

    fn metadata_provider(&self, address: &Address) -> Option<&dyn MetadataProvider> {
        self.providers.get(address).map(|provider| provider.as_ref())
    }
}

/// A resolver bound to the chain's directory for read queries
#[derive(Debug, Clone, Copy)]
pub struct ResolverView<'a> {
    resolver: &'a Resolver,
    directory: DirectoryView<'a>,
}

impl<'a> ResolverView<'a> {
    pub fn contract(&self) -> &'a Resolver {
        self.resolver
    }

    pub fn get_factories(&self) -> Vec<Address> {
        self.resolver.get_factories()
    }

    pub fn is_tld_deprecated(&self, tld_address: &Address) -> bool {
        self.resolver.is_tld_deprecated(tld_address)
    }

    pub fn get_tld_address(&self, tld_name: &str) -> Address {
        self.resolver.get_tld_address(&self.directory, tld_name)
    }

    pub fn get_tld_factory_address(&self, tld_name: &str) -> Address {
        self.resolver.get_tld_factory_address(&self.directory, tld_name)
    }

    pub fn get_tlds(&self) -> Vec<TldEntry> {
        self.resolver.get_tlds(&self.directory)
    }

    pub fn get_tlds_page(&self, offset: usize, limit: usize) -> Vec<TldEntry> {
        self.resolver.get_tlds_page(&self.directory, offset, limit)
    }

    pub fn get_domain_holder(&self, domain_name: &str, tld_name: &str) -> Address {
        self.resolver.get_domain_holder(&self.directory, domain_name, tld_name)
    }

    pub fn get_domain_token_uri(&self, domain_name: &str, tld_name: &str) -> String {
        self.resolver
            .get_domain_token_uri(&self.directory, domain_name, tld_name)
    }

    pub fn get_domain_data(&self, domain_name: &str, tld_name: &str) -> String {
        self.resolver.get_domain_data(&self.directory, domain_name, tld_name)
    }

    pub fn get_default_domain(&self, holder: &Address, tld_name: &str) -> String {
        self.resolver.get_default_domain(&self.directory, holder, tld_name)
    }

    pub fn get_first_default_domain(&self, holder: &Address) -> String {
        self.resolver.get_first_default_domain(&self.directory, holder)
    }

    pub fn get_default_domains(&self, holder: &Address) -> Vec<String> {
        self.resolver.get_default_domains(&self.directory, holder)
    }
}

#[derive(Debug)]
pub struct DomainChain {
    config: RegistryConfig,
    state: ContractState,
    providers: ProviderMap,
    block_number: u64,
    events: InMemoryEventIndexer,
}

impl DomainChain {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: ContractState::default(),
            providers: BTreeMap::new(),
            block_number: 0,
            events: InMemoryEventIndexer::new(),
        }
    }

    /// Rebuild a chain from a verified snapshot
    ///
    /// Metadata providers are not part of the snapshot; re-attach them with
    /// [`DomainChain::attach_metadata_provider`]. Event history starts empty.
    pub fn restore(config: RegistryConfig, snapshot: ChainSnapshot) -> SnapshotResult<Self> {
        snapshot.verify()?;
        info!(
            "Restored domain chain at block {} ({} TLDs)",
            snapshot.block_number,
            snapshot.state.contracts.tlds.len()
        );
        Ok(Self {
            config,
            state: snapshot.state,
            providers: BTreeMap::new(),
            block_number: snapshot.block_number,
            events: InMemoryEventIndexer::new(),
        })
    }

    pub fn snapshot(&self) -> SnapshotResult<ChainSnapshot> {
        ChainSnapshot::capture(self.block_number, &self.state)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn state(&self) -> &ContractState {
        &self.state
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn events(&self) -> &InMemoryEventIndexer {
        &self.events
    }

    pub fn directory(&self) -> DirectoryView<'_> {
        DirectoryView::new(&self.state.contracts, &self.providers)
    }

    // ------------------------------------------------------------------
    // Contract reads
    // ------------------------------------------------------------------

    pub fn forbidden(&self, address: &Address) -> Option<&ForbiddenNameRegistry> {
        self.state.contracts.forbidden.get(address)
    }

    pub fn factory(&self, address: &Address) -> Option<&TldFactory> {
        self.state.contracts.factories.get(address)
    }

    pub fn tld(&self, address: &Address) -> Option<&TldRegistry> {
        self.state.contracts.tlds.get(address)
    }

    pub fn resolver(&self, address: &Address) -> Option<ResolverView<'_>> {
        let resolver = self.state.resolvers.get(address)?;
        Some(ResolverView {
            resolver,
            directory: self.directory(),
        })
    }

    /// Token URI read straight from a TLD registry
    pub fn token_uri(&self, tld: &Address, token_id: TokenId) -> ContractResult<String> {
        let registry = self.tld(tld).ok_or(ContractError::UnknownContract(*tld))?;
        let metadata = registry.metadata_address();
        let provider = self
            .providers
            .get(&metadata)
            .ok_or(ContractError::UnknownContract(metadata))?;
        registry.token_uri(token_id, provider.as_ref())
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Run `op` as one atomic transaction in the next block
    pub fn transact<T>(
        &mut self,
        caller: Address,
        value: Wei,
        op: impl FnOnce(&mut ContractState, &ProviderMap, &mut ExecutionContext) -> ContractResult<T>,
    ) -> ContractResult<T> {
        let block_number = self.block_number + 1;
        let timestamp = self
            .config
            .chain
            .genesis_timestamp
            .saturating_add(block_number.saturating_mul(self.config.chain.block_time_secs));
        let mut ctx = ExecutionContext::new(caller, block_number, timestamp).with_value(value);

        let mut staged = self.state.clone();
        match op(&mut staged, &self.providers, &mut ctx) {
            Ok(output) => {
                self.state = staged;
                self.block_number = block_number;
                let events = ctx.take_events();
                debug!("Block {} committed with {} events", block_number, events.len());
                for record in events {
                    self.events.index_event(record);
                }
                Ok(output)
            }
            Err(err) => {
                warn!("Transaction from {} reverted: {}", caller, err);
                Err(err)
            }
        }
    }

    fn with_forbidden<T>(
        &mut self,
        caller: Address,
        address: Address,
        op: impl FnOnce(&mut ForbiddenNameRegistry, &mut ExecutionContext) -> ContractResult<T>,
    ) -> ContractResult<T> {
        self.transact(caller, 0, move |state, _, ctx| {
            ctx.enter(address);
            op(state.contracts.forbidden_mut(&address)?, ctx)
        })
    }

    fn with_factory<T>(
        &mut self,
        caller: Address,
        address: Address,
        op: impl FnOnce(&mut TldFactory, &mut ExecutionContext) -> ContractResult<T>,
    ) -> ContractResult<T> {
        self.transact(caller, 0, move |state, _, ctx| {
            ctx.enter(address);
            op(state.contracts.factory_mut(&address)?, ctx)
        })
    }

    fn with_tld<T>(
        &mut self,
        caller: Address,
        value: Wei,
        address: Address,
        op: impl FnOnce(&mut TldRegistry, &mut ExecutionContext) -> ContractResult<T>,
    ) -> ContractResult<T> {
        self.transact(caller, value, move |state, _, ctx| {
            ctx.enter(address);
            op(state.contracts.tld_mut(&address)?, ctx)
        })
    }

    fn with_resolver<T>(
        &mut self,
        caller: Address,
        address: Address,
        op: impl FnOnce(&mut Resolver, &dyn ContractDirectory, &mut ExecutionContext) -> ContractResult<T>,
    ) -> ContractResult<T> {
        self.transact(caller, 0, move |state, providers, ctx| {
            ctx.enter(address);
            let ContractState {
                contracts, resolvers, ..
            } = state;
            let resolver = resolvers
                .get_mut(&address)
                .ok_or(ContractError::UnknownContract(address))?;
            op(resolver, &DirectoryView::new(contracts, providers), ctx)
        })
    }

    // ------------------------------------------------------------------
    // Deployment
    // ------------------------------------------------------------------

    /// Deploy a forbidden-name registry seeded from configuration
    pub fn deploy_forbidden_registry(&mut self, deployer: Address) -> ContractResult<Address> {
        let seed = self.config.forbidden.seed.clone();
        self.transact(deployer, 0, move |state, _, ctx| {
            let address = state.next_contract_address(&deployer);
            ctx.enter(address);
            state
                .contracts
                .forbidden
                .insert(address, ForbiddenNameRegistry::new(deployer, &seed));
            info!("Deployed forbidden-name registry at {} ({} seeded names)", address, seed.len());
            Ok(address)
        })
    }

    /// Deploy a metadata provider at a fresh address
    pub fn deploy_metadata_provider(
        &mut self,
        deployer: Address,
        provider: Arc<dyn MetadataProvider>,
    ) -> ContractResult<Address> {
        let address = self.transact(deployer, 0, |state, _, ctx| {
            let address = state.next_contract_address(&deployer);
            ctx.enter(address);
            state.contracts.metadata.insert(address);
            Ok(address)
        })?;
        self.providers.insert(address, provider);
        info!("Deployed metadata provider at {}", address);
        Ok(address)
    }

    /// Re-bind provider code to a metadata address, e.g. after a restore
    pub fn attach_metadata_provider(
        &mut self,
        address: Address,
        provider: Arc<dyn MetadataProvider>,
    ) -> ContractResult<()> {
        if !self.state.contracts.metadata.contains(&address) {
            return Err(ContractError::UnknownContract(address));
        }
        self.providers.insert(address, provider);
        Ok(())
    }

    pub fn deploy_factory(
        &mut self,
        deployer: Address,
        price: Wei,
        forbidden: Address,
        metadata: Address,
    ) -> ContractResult<Address> {
        let config = self.config.clone();
        self.transact(deployer, 0, move |state, _, ctx| {
            if !state.contracts.forbidden.contains_key(&forbidden) {
                return Err(ContractError::UnknownContract(forbidden));
            }
            if !state.contracts.metadata.contains(&metadata) {
                return Err(ContractError::UnknownContract(metadata));
            }

            let address = state.next_contract_address(&deployer);
            ctx.enter(address);
            state.contracts.factories.insert(
                address,
                TldFactory::new(address, deployer, price, forbidden, metadata, &config),
            );
            info!("Deployed TLD factory at {} (price {})", address, price);
            Ok(address)
        })
    }

    pub fn deploy_resolver(&mut self, deployer: Address) -> ContractResult<Address> {
        let config = self.config.resolver.clone();
        self.transact(deployer, 0, move |state, _, ctx| {
            let address = state.next_contract_address(&deployer);
            ctx.enter(address);
            state.resolvers.insert(address, Resolver::new(deployer, &config));
            info!("Deployed resolver at {}", address);
            Ok(address)
        })
    }

    /// Hand any deployed contract to a new owner
    pub fn transfer_ownership(&mut self, caller: Address, contract: Address, new_owner: Address) -> ContractResult<()> {
        self.transact(caller, 0, move |state, _, ctx| {
            ctx.enter(contract);
            if let Some(registry) = state.contracts.forbidden.get_mut(&contract) {
                return registry.transfer_ownership(ctx, new_owner);
            }
            if let Some(factory) = state.contracts.factories.get_mut(&contract) {
                return factory.transfer_ownership(ctx, new_owner);
            }
            if let Some(tld) = state.contracts.tlds.get_mut(&contract) {
                return tld.transfer_ownership(ctx, new_owner);
            }
            if let Some(resolver) = state.resolvers.get_mut(&contract) {
                return resolver.transfer_ownership(ctx, new_owner);
            }
            Err(ContractError::UnknownContract(contract))
        })
    }

    // ------------------------------------------------------------------
    // Forbidden-name registry
    // ------------------------------------------------------------------

    pub fn forbidden_add_factory(&mut self, caller: Address, forbidden: Address, factory: Address) -> ContractResult<()> {
        self.with_forbidden(caller, forbidden, |registry, ctx| registry.add_factory_address(ctx, factory))
    }

    pub fn set_transitive_grants(&mut self, caller: Address, forbidden: Address, enabled: bool) -> ContractResult<()> {
        self.with_forbidden(caller, forbidden, |registry, ctx| registry.set_transitive_grants(ctx, enabled))
    }

    pub fn owner_add_forbidden_tld(&mut self, caller: Address, forbidden: Address, name: &str) -> ContractResult<()> {
        self.with_forbidden(caller, forbidden, |registry, ctx| registry.owner_add_forbidden_tld(ctx, name))
    }

    // ------------------------------------------------------------------
    // Factory
    // ------------------------------------------------------------------

    /// Paid TLD creation; returns the new registry's address
    pub fn create_tld(&mut self, caller: Address, factory: Address, value: Wei, params: TldParams) -> ContractResult<Address> {
        self.deploy_tld(caller, factory, value, params, false)
    }

    /// Owner TLD creation, free and independent of the buying flag
    pub fn owner_create_tld(&mut self, caller: Address, factory: Address, params: TldParams) -> ContractResult<Address> {
        self.deploy_tld(caller, factory, 0, params, true)
    }

    fn deploy_tld(
        &mut self,
        caller: Address,
        factory: Address,
        value: Wei,
        params: TldParams,
        as_owner: bool,
    ) -> ContractResult<Address> {
        self.transact(caller, value, move |state, _, ctx| {
            ctx.enter(factory);
            let contracts = &mut state.contracts;
            let creator = contracts
                .factories
                .get_mut(&factory)
                .ok_or(ContractError::UnknownContract(factory))?;
            let forbidden_address = creator.forbidden_address();
            let forbidden = contracts
                .forbidden
                .get_mut(&forbidden_address)
                .ok_or(ContractError::UnknownContract(forbidden_address))?;

            let deployed = if as_owner {
                creator.owner_create_tld(ctx, forbidden, params)?
            } else {
                creator.create_tld(ctx, forbidden, params)?
            };

            let address = deployed.record.contract_address;
            if contracts.is_deployed(&address) {
                return Err(ContractError::TldAlreadyExists {
                    name: deployed.record.name,
                });
            }
            contracts.tlds.insert(address, deployed.registry);
            Ok(address)
        })
    }

    pub fn toggle_buying_tlds(&mut self, caller: Address, factory: Address) -> ContractResult<()> {
        self.with_factory(caller, factory, |factory, ctx| factory.toggle_buying_tlds(ctx))
    }

    pub fn change_factory_price(&mut self, caller: Address, factory: Address, price: Wei) -> ContractResult<()> {
        self.with_factory(caller, factory, |factory, ctx| factory.change_price(ctx, price))
    }

    pub fn change_factory_royalty(&mut self, caller: Address, factory: Address, royalty_bps: u16) -> ContractResult<()> {
        self.with_factory(caller, factory, |factory, ctx| factory.change_royalty(ctx, royalty_bps))
    }

    // ------------------------------------------------------------------
    // TLD registry
    // ------------------------------------------------------------------

    pub fn mint_domain(
        &mut self,
        caller: Address,
        tld: Address,
        value: Wei,
        domain_name: &str,
        holder: Address,
        referrer: Address,
    ) -> ContractResult<TokenId> {
        self.with_tld(caller, value, tld, |registry, ctx| {
            registry.mint(ctx, domain_name, holder, referrer)
        })
    }

    pub fn burn_domain(&mut self, caller: Address, tld: Address, domain_name: &str) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.burn(ctx, domain_name))
    }

    pub fn transfer_domain(
        &mut self,
        caller: Address,
        tld: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.transfer_from(ctx, from, to, token_id))
    }

    pub fn approve_domain(&mut self, caller: Address, tld: Address, to: Address, token_id: TokenId) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.approve(ctx, to, token_id))
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        tld: Address,
        operator: Address,
        approved: bool,
    ) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| {
            registry.set_approval_for_all(ctx, operator, approved)
        })
    }

    pub fn edit_default_domain(&mut self, caller: Address, tld: Address, domain_name: &str) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.edit_default_domain(ctx, domain_name))
    }

    pub fn edit_domain_data(&mut self, caller: Address, tld: Address, domain_name: &str, data: &str) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.edit_data(ctx, domain_name, data))
    }

    pub fn change_tld_price(&mut self, caller: Address, tld: Address, price: Wei) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.change_price(ctx, price))
    }

    pub fn toggle_buying_domains(&mut self, caller: Address, tld: Address) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.toggle_buying_domains(ctx))
    }

    pub fn change_minter(&mut self, caller: Address, tld: Address, minter: Address) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.change_minter(ctx, minter))
    }

    pub fn change_name_max_length(&mut self, caller: Address, tld: Address, max_length: usize) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.change_name_max_length(ctx, max_length))
    }

    pub fn change_metadata_address(&mut self, caller: Address, tld: Address, metadata: Address) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.change_metadata_address(ctx, metadata))
    }

    pub fn freeze_metadata(&mut self, caller: Address, tld: Address) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.freeze_metadata(ctx))
    }

    pub fn change_tld_royalty(&mut self, caller: Address, tld: Address, royalty_bps: u16) -> ContractResult<()> {
        self.with_tld(caller, 0, tld, |registry, ctx| registry.change_royalty(ctx, royalty_bps))
    }

    // ------------------------------------------------------------------
    // Resolver
    // ------------------------------------------------------------------

    pub fn resolver_add_factory(&mut self, caller: Address, resolver: Address, factory: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.add_factory_address(ctx, factory))
    }

    pub fn resolver_remove_factory(&mut self, caller: Address, resolver: Address, factory: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.remove_factory_address(ctx, factory))
    }

    pub fn resolver_add_manager(&mut self, caller: Address, resolver: Address, manager: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.add_manager(ctx, manager))
    }

    pub fn resolver_remove_manager(&mut self, caller: Address, resolver: Address, manager: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.remove_manager(ctx, manager))
    }

    pub fn deprecate_tld(&mut self, caller: Address, resolver: Address, tld: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.add_deprecated_tld_address(ctx, tld))
    }

    pub fn set_custom_default_domain(
        &mut self,
        caller: Address,
        resolver: Address,
        domain_name: &str,
        tld_name: &str,
    ) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, dir, ctx| {
            resolver.set_custom_default_domain(ctx, dir, domain_name, tld_name)
        })
    }

    pub fn clear_custom_default_domain(&mut self, caller: Address, resolver: Address) -> ContractResult<()> {
        self.with_resolver(caller, resolver, |resolver, _, ctx| resolver.clear_custom_default_domain(ctx))
    }
}
