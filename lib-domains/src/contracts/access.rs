//! Ownership and manager-list access control

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::events::DomainEvent;
use super::executor::ExecutionContext;
use crate::errors::{ContractError, ContractResult};
use crate::types::Address;

/// Single-owner access control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, account: &Address) -> bool {
        &self.owner == account
    }

    pub fn only_owner(&self, ctx: &ExecutionContext) -> ContractResult<()> {
        if self.is_owner(&ctx.caller) {
            Ok(())
        } else {
            Err(ContractError::NotOwner)
        }
    }

    pub fn transfer_ownership(&mut self, ctx: &mut ExecutionContext, new_owner: Address) -> ContractResult<()> {
        self.only_owner(ctx)?;
        if new_owner.is_zero() {
            return Err(ContractError::NewOwnerIsZero);
        }

        let previous_owner = self.owner;
        self.owner = new_owner;
        ctx.emit(DomainEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }
}

/// Owner plus a set of managers; operator-gated calls accept either
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Managed {
    ownable: Ownable,
    managers: BTreeSet<Address>,
}

impl Managed {
    pub fn new(owner: Address) -> Self {
        Self {
            ownable: Ownable::new(owner),
            managers: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn ownable(&self) -> &Ownable {
        &self.ownable
    }

    pub fn ownable_mut(&mut self) -> &mut Ownable {
        &mut self.ownable
    }

    pub fn is_manager(&self, account: &Address) -> bool {
        self.managers.contains(account)
    }

    pub fn managers(&self) -> impl Iterator<Item = &Address> {
        self.managers.iter()
    }

    pub fn only_operator(&self, ctx: &ExecutionContext) -> ContractResult<()> {
        if self.ownable.is_owner(&ctx.caller) || self.is_manager(&ctx.caller) {
            Ok(())
        } else {
            Err(ContractError::NotManager)
        }
    }

    pub fn add_manager(&mut self, ctx: &mut ExecutionContext, manager: Address) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        if manager.is_zero() {
            return Err(ContractError::ZeroAddress);
        }

        if self.managers.insert(manager) {
            ctx.emit(DomainEvent::ManagerAdded { manager });
        }
        Ok(())
    }

    pub fn remove_manager(&mut self, ctx: &mut ExecutionContext, manager: Address) -> ContractResult<()> {
        self.ownable.only_owner(ctx)?;
        if self.managers.remove(&manager) {
            ctx.emit(DomainEvent::ManagerRemoved { manager });
        }
        Ok(())
    }
}
