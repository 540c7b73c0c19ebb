//! # Domain Registry
//!
//! On-chain TLD and domain-name registry: a factory deploys one NFT registry
//! per top-level domain, each registry mints domain names under its TLD, and
//! a resolver aggregates lookups across every factory it has been told
//! about. A shared forbidden-name registry keeps TLD names unique across
//! factories.
//!
//! Contracts are plain Rust values executed through [`chain::DomainChain`],
//! which applies each call as an atomic transaction.

pub mod chain;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod snapshot;
pub mod types;

pub use chain::{ContractState, Contracts, DirectoryView, DomainChain, ResolverView};
pub use config::{ConfigError, RegistryConfig};
pub use contracts::{
    DomainEvent, ExecutionContext, ForbiddenNameRegistry, MetadataProvider, PlainMetadata, Resolver, TldFactory,
    TldParams, TldRegistry,
};
pub use errors::{ContractError, ContractResult};
pub use snapshot::{ChainSnapshot, SnapshotError};
pub use types::{Address, TokenId, Wei};
