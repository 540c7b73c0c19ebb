//! # Domain Registry Contracts
//!
//! Forbidden-name registry, TLD factory, per-TLD NFT registry and resolver,
//! plus the execution plumbing they share.

pub mod access;
pub mod directory;
pub mod events;
pub mod executor;
pub mod factory;
pub mod forbidden;
pub mod metadata;
pub mod resolver;
pub mod storage;
pub mod tld;

pub use access::{Managed, Ownable};
pub use directory::{ContractDirectory, TldReader, TldSource};
pub use events::{DomainEvent, EventIndexer, EventRecord, InMemoryEventIndexer};
pub use executor::{CallOrigin, ExecutionContext};
pub use factory::{validate_tld_name, DeployedTld, TldFactory, TldParams, TldRecord};
pub use forbidden::{FactoryGrant, ForbiddenNameRegistry, ForbiddenTldRegistry};
pub use metadata::{MetadataProvider, PlainMetadata};
pub use resolver::{CustomDefault, Resolver, TldEntry};
pub use storage::Registry;
pub use tld::{normalize_domain_name, Domain, TldRegistry, TldRegistryParams};
