#![allow(dead_code)]

use std::sync::Arc;

use lib_domains::types::{ether, milli_ether};
use lib_domains::{Address, DomainChain, PlainMetadata, RegistryConfig, ResolverView, TldParams, Wei};

pub const DOMAIN_PRICE: Wei = milli_ether(100);

pub fn addr(id: u64) -> Address {
    Address::from_low_u64(id)
}

pub fn owner() -> Address {
    addr(1)
}

pub fn alice() -> Address {
    addr(10)
}

pub fn bob() -> Address {
    addr(11)
}

/// Contracts wired the way a fresh deployment wires them
pub struct Deployment {
    pub chain: DomainChain,
    pub forbidden: Address,
    pub metadata: Address,
    pub factory: Address,
    pub resolver: Address,
}

impl Deployment {
    /// Forbidden registry, metadata, a factory priced at 1 coin with buying
    /// enabled, and a resolver scanning that factory
    pub fn new() -> Self {
        let mut chain = DomainChain::new(RegistryConfig::default());
        let forbidden = chain.deploy_forbidden_registry(owner()).unwrap();
        let metadata = chain
            .deploy_metadata_provider(owner(), Arc::new(PlainMetadata::new()))
            .unwrap();
        let factory = chain.deploy_factory(owner(), ether(1), forbidden, metadata).unwrap();
        chain.forbidden_add_factory(owner(), forbidden, factory).unwrap();
        chain.toggle_buying_tlds(owner(), factory).unwrap();

        let resolver = chain.deploy_resolver(owner()).unwrap();
        chain.resolver_add_factory(owner(), resolver, factory).unwrap();

        Self {
            chain,
            forbidden,
            metadata,
            factory,
            resolver,
        }
    }

    /// A second factory sharing the forbidden registry, registered with the resolver
    pub fn add_factory(&mut self) -> Address {
        let factory = self
            .chain
            .deploy_factory(owner(), ether(1), self.forbidden, self.metadata)
            .unwrap();
        self.chain.forbidden_add_factory(owner(), self.forbidden, factory).unwrap();
        self.chain.resolver_add_factory(owner(), self.resolver, factory).unwrap();
        factory
    }

    /// Owner-created TLD with public buying at `DOMAIN_PRICE`
    pub fn tld(&mut self, name: &str) -> Address {
        self.tld_in(self.factory, name)
    }

    pub fn tld_in(&mut self, factory: Address, name: &str) -> Address {
        let params = TldParams::new(name, &name[1..].to_uppercase(), owner(), DOMAIN_PRICE, true);
        self.chain.owner_create_tld(owner(), factory, params).unwrap()
    }

    pub fn buy(&mut self, tld: Address, name: &str, holder: Address) -> u64 {
        self.chain
            .mint_domain(holder, tld, DOMAIN_PRICE, name, holder, Address::ZERO)
            .unwrap()
    }

    pub fn resolver(&self) -> ResolverView<'_> {
        self.chain.resolver(&self.resolver).unwrap()
    }
}
