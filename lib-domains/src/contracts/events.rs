//! Contract Events
//!
//! Every committed state change emits an event. Events buffered in the
//! execution context are only indexed once their transaction commits; a
//! reverted transaction leaves no events behind.

use serde::{Deserialize, Serialize};

use crate::types::{Address, TokenId, Wei};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomainEvent {
    // Forbidden-name registry
    ForbiddenTldAdded {
        name: String,
    },
    FactoryAllowed {
        factory: Address,
        granted_by: Address,
    },
    TransitiveGrantsChanged {
        enabled: bool,
    },

    // Factory
    TldCreated {
        creator: Address,
        tld_owner: Address,
        name: String,
        tld_address: Address,
        paid: Wei,
    },
    FactorySettingChanged {
        setting: String,
        value: String,
    },

    // TLD registry
    DomainCreated {
        minter: Address,
        holder: Address,
        full_name: String,
        token_id: TokenId,
        referrer: Address,
    },
    DomainBurned {
        holder: Address,
        full_name: String,
    },
    Transfer {
        from: Address,
        to: Address,
        token_id: TokenId,
    },
    Approval {
        owner: Address,
        approved: Address,
        token_id: TokenId,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    DefaultDomainChanged {
        user: Address,
        default_domain: String,
    },
    DataChanged {
        user: Address,
        domain: String,
    },
    TldSettingChanged {
        setting: String,
        value: String,
    },

    // Resolver
    ResolverFactoryAdded {
        factory: Address,
    },
    ResolverFactoryRemoved {
        factory: Address,
    },
    ManagerAdded {
        manager: Address,
    },
    ManagerRemoved {
        manager: Address,
    },
    TldDeprecated {
        tld_address: Address,
    },
    CustomDefaultDomainSet {
        user: Address,
        domain_name: String,
        tld_name: String,
    },
    CustomDefaultDomainCleared {
        user: Address,
    },

    // Shared
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ForbiddenTldAdded { .. } => "ForbiddenTldAdded",
            DomainEvent::FactoryAllowed { .. } => "FactoryAllowed",
            DomainEvent::TransitiveGrantsChanged { .. } => "TransitiveGrantsChanged",
            DomainEvent::TldCreated { .. } => "TldCreated",
            DomainEvent::FactorySettingChanged { .. } => "FactorySettingChanged",
            DomainEvent::DomainCreated { .. } => "DomainCreated",
            DomainEvent::DomainBurned { .. } => "DomainBurned",
            DomainEvent::Transfer { .. } => "Transfer",
            DomainEvent::Approval { .. } => "Approval",
            DomainEvent::ApprovalForAll { .. } => "ApprovalForAll",
            DomainEvent::DefaultDomainChanged { .. } => "DefaultDomainChanged",
            DomainEvent::DataChanged { .. } => "DataChanged",
            DomainEvent::TldSettingChanged { .. } => "TldSettingChanged",
            DomainEvent::ResolverFactoryAdded { .. } => "ResolverFactoryAdded",
            DomainEvent::ResolverFactoryRemoved { .. } => "ResolverFactoryRemoved",
            DomainEvent::ManagerAdded { .. } => "ManagerAdded",
            DomainEvent::ManagerRemoved { .. } => "ManagerRemoved",
            DomainEvent::TldDeprecated { .. } => "TldDeprecated",
            DomainEvent::CustomDefaultDomainSet { .. } => "CustomDefaultDomainSet",
            DomainEvent::CustomDefaultDomainCleared { .. } => "CustomDefaultDomainCleared",
            DomainEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// An event together with the contract that emitted it and the block it
/// was committed in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub contract: Address,
    pub block_number: u64,
    pub event: DomainEvent,
}

/// Event indexer interface
pub trait EventIndexer {
    /// Index a committed event
    fn index_event(&mut self, record: EventRecord);

    /// All events emitted by one contract, oldest first
    fn get_contract_events(&self, contract: &Address) -> Vec<&EventRecord>;

    /// All events of one type, oldest first
    fn get_events_by_type(&self, event_type: &str) -> Vec<&EventRecord>;

    /// Events committed in `[start_block, end_block]`
    fn get_events_in_range(&self, start_block: u64, end_block: u64) -> Vec<&EventRecord>;

    fn get_latest_event(&self, contract: &Address) -> Option<&EventRecord>;
}

/// In-memory event indexer
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventIndexer {
    events: Vec<EventRecord>,
}

impl InMemoryEventIndexer {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn all(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventIndexer for InMemoryEventIndexer {
    fn index_event(&mut self, record: EventRecord) {
        self.events.push(record);
    }

    fn get_contract_events(&self, contract: &Address) -> Vec<&EventRecord> {
        self.events.iter().filter(|r| &r.contract == contract).collect()
    }

    fn get_events_by_type(&self, event_type: &str) -> Vec<&EventRecord> {
        self.events
            .iter()
            .filter(|r| r.event.event_type() == event_type)
            .collect()
    }

    fn get_events_in_range(&self, start_block: u64, end_block: u64) -> Vec<&EventRecord> {
        self.events
            .iter()
            .filter(|r| r.block_number >= start_block && r.block_number <= end_block)
            .collect()
    }

    fn get_latest_event(&self, contract: &Address) -> Option<&EventRecord> {
        self.events.iter().rev().find(|r| &r.contract == contract)
    }
}
