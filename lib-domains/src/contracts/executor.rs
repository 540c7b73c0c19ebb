//! Execution context passed to every state-changing contract call
//!
//! Authorization is derived exclusively from the context: a contract never
//! trusts a caller address supplied as a parameter.

use serde::{Deserialize, Serialize};

use super::events::{DomainEvent, EventRecord};
use crate::types::{Address, Wei};

/// Discriminates the origin of a contract call for authorization purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOrigin {
    /// Caller signed the transaction directly
    User,
    /// Caller is another contract acting within the same transaction
    Contract,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Immediate caller of the current contract
    pub caller: Address,
    /// Currently executing contract address
    pub contract: Address,
    pub call_origin: CallOrigin,
    /// Native value attached to the call
    pub value: Wei,
    pub block_number: u64,
    pub timestamp: u64,
    /// Hash of the transaction triggering this execution
    pub tx_hash: [u8; 32],
    /// Events buffered until the transaction commits
    events: Vec<EventRecord>,
}

impl ExecutionContext {
    /// Context for a user-initiated call with no value attached
    pub fn new(caller: Address, block_number: u64, timestamp: u64) -> Self {
        Self {
            caller,
            contract: Address::ZERO,
            call_origin: CallOrigin::User,
            value: 0,
            block_number,
            timestamp,
            tx_hash: derive_tx_hash(&caller, block_number, timestamp),
            events: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }

    /// Point the context at the contract about to execute
    pub fn enter(&mut self, contract: Address) {
        self.contract = contract;
    }

    /// Run `f` as a contract-to-contract call: the current contract becomes
    /// the caller, `target` becomes the executing contract and no value is
    /// forwarded. The outer frame is restored afterwards.
    pub fn call_contract<R>(&mut self, target: Address, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = (self.caller, self.contract, self.call_origin, self.value);

        self.caller = self.contract;
        self.contract = target;
        self.call_origin = CallOrigin::Contract;
        self.value = 0;

        let result = f(self);

        self.caller = saved.0;
        self.contract = saved.1;
        self.call_origin = saved.2;
        self.value = saved.3;
        result
    }

    pub fn emit(&mut self, event: DomainEvent) {
        self.events.push(EventRecord {
            contract: self.contract,
            block_number: self.block_number,
            event,
        });
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }
}

fn derive_tx_hash(caller: &Address, block_number: u64, timestamp: u64) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"DOMAINS_TX_V1");
    hasher.update(caller.as_bytes());
    hasher.update(&block_number.to_be_bytes());
    hasher.update(&timestamp.to_be_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_call_swaps_and_restores_frame() {
        let user = Address::from_low_u64(1);
        let factory = Address::from_low_u64(2);
        let registry = Address::from_low_u64(3);

        let mut ctx = ExecutionContext::new(user, 5, 100).with_value(42);
        ctx.enter(factory);

        let seen = ctx.call_contract(registry, |inner| {
            inner.emit(DomainEvent::ForbiddenTldAdded { name: ".x".into() });
            (inner.caller, inner.contract, inner.call_origin, inner.value)
        });

        assert_eq!(seen, (factory, registry, CallOrigin::Contract, 0));
        assert_eq!(ctx.caller, user);
        assert_eq!(ctx.contract, factory);
        assert_eq!(ctx.call_origin, CallOrigin::User);
        assert_eq!(ctx.value, 42);

        let events = ctx.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].contract, registry);
        assert_eq!(events[0].block_number, 5);
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_tx_hash_depends_on_caller() {
        let a = ExecutionContext::new(Address::from_low_u64(1), 1, 1);
        let b = ExecutionContext::new(Address::from_low_u64(2), 1, 1);
        assert_ne!(a.tx_hash, b.tx_hash);
    }
}
