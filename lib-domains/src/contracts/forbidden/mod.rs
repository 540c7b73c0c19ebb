//! Forbidden TLD Registry
//!
//! Shared set of TLD names no factory may create, plus the allowlist of
//! factories permitted to extend it. Factories add every TLD they create,
//! which keeps names unique across all factories sharing one registry.
//!
//! # Invariants
//! - Both the forbidden set and the factory allowlist are append-only
//! - Every allowlist grant is recorded with its granter and block
//! - Only the owner grants by default; an allowlisted factory may grant
//!   further factories only while `transitive_grants` is enabled

use serde::{Deserialize, Serialize};

use super::access::Ownable;
use super::events::DomainEvent;
use super::executor::ExecutionContext;
use super::storage::Registry;
use crate::errors::{ContractError, ContractResult};
use crate::types::Address;


/// What a factory needs from the forbidden-name registry
pub trait ForbiddenTldRegistry {
    fn is_forbidden(&self, name: &str) -> bool;

    /// Record a newly created TLD; the context caller must be an allowed factory
    fn add_forbidden_tld(&mut self, ctx: &mut ExecutionContext, name: &str) -> ContractResult<()>;
}

/// Audit record of one allowlist grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryGrant {
    pub factory: Address,
    pub granted_by: Address,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenNameRegistry {
    ownable: Ownable,
    /// Forbidden name → block it was added in (0 for the constructor seed)
    forbidden: Registry<String, u64>,
    factories: Registry<Address, FactoryGrant>,
    transitive_grants: bool,
}

impl ForbiddenNameRegistry {
    pub fn new<S: AsRef<str>>(owner: Address, seed: &[S]) -> Self {
        let mut forbidden = Registry::new();
        for name in seed {
            forbidden.put(name.as_ref().to_string(), 0);
        }

        Self {
            ownable: Ownable::new(owner),
            forbidden,
            factories: Registry::new(),
            transitive_grants: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn is_forbidden(&self, name: &str) -> bool {
        self.forbidden.exists(&name.to_string())
    }

    pub fn is_factory(&self, address: &Address) -> bool {
        self.factories.exists(address)
    }

    pub fn transitive_grants(&self) -> bool {
        self.transitive_grants
    }

    /// Allowlist grants in the order they were made
    pub fn grants(&self) -> Vec<&FactoryGrant> {
        self.factories.iter().map(|(_, grant)| grant).collect()
    }

    /// Forbidden names in the order they were added
    pub fn forbidden_names(&self) -> &[String] {
        self.forbidden.keys()
    }

    /// Allow `factory` to add forbidden names (and, under the transitive
    /// policy, to grant others). Granting an allowlisted factory again is a
    /// no-op and emits nothing.
    pub fn add_factory_address(&mut self, ctx: &mut ExecutionContext, factory: Address) -> ContractResult<()> {
        let caller = ctx.caller;
        let by_owner = self.ownable.is_owner(&caller);
        let by_factory = self.transitive_grants && self.is_factory(&caller);
        if !by_owner && !by_factory {
            return Err(ContractError::NotFactoryGranter);
        }
        if factory.is_zero() {
            return Err(ContractError::ZeroAddress);
        }
        if self.is_factory(&factory) {
            return Ok(());
        }

        self.factories.put(
            factory,
            FactoryGrant {
                factory,
                granted_by: caller,
                block_number: ctx.block_number,
            },
        );
        tracing::info!("Factory {} allowlisted by {} (owner grant: {})", factory, caller, by_owner);
        ctx.emit(DomainEvent::FactoryAllowed {
            factory,
            granted_by: caller,
        });
        Ok(())
    }

    pub fn set_transitive_grants(&mut self, ctx: &mut ExecutionContext, enabled: bool) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.transitive_grants = enabled;
        tracing::info!("Transitive factory grants set to {}", enabled);
        ctx.emit(DomainEvent::TransitiveGrantsChanged { enabled });
        Ok(())
    }

    pub fn owner_add_forbidden_tld(&mut self, ctx: &mut ExecutionContext, name: &str) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        self.insert_forbidden(ctx, name);
        Ok(())
    }

    pub fn transfer_ownership(&mut self, ctx: &mut ExecutionContext, new_owner: Address) -> ContractResult<()> {
        self.ownable.transfer_ownership(ctx, new_owner)
    }

    fn insert_forbidden(&mut self, ctx: &mut ExecutionContext, name: &str) {
        if self.forbidden.exists(&name.to_string()) {
            return;
        }
        self.forbidden.put(name.to_string(), ctx.block_number);
        ctx.emit(DomainEvent::ForbiddenTldAdded {
            name: name.to_string(),
        });
    }
}

impl ForbiddenTldRegistry for ForbiddenNameRegistry {
    fn is_forbidden(&self, name: &str) -> bool {
        ForbiddenNameRegistry::is_forbidden(self, name)
    }

    fn add_forbidden_tld(&mut self, ctx: &mut ExecutionContext, name: &str) -> ContractResult<()> {
        if !self.is_factory(&ctx.caller) {
            return Err(ContractError::NotFactory);
        }
        self.insert_forbidden(ctx, name);
        Ok(())
    }
}
