//! Snapshot capture and restore
//!
//! A snapshot is the complete contract state at one block, bincode-encoded,
//! with a BLAKE3 hash over the encoded state. Restoring verifies both the
//! format version and the hash before any state is trusted.
//!
//! # Guarantees
//! - Same state always produces the same hash (all state maps are ordered)
//! - A restored chain resumes at `block_number + 1`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::ContractState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("State hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Invalid snapshot version: {0}")]
    InvalidVersion(u32),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub version: u32,
    pub block_number: u64,
    pub state: ContractState,
    pub state_hash: [u8; 32],
}

/// Counts shown by diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub version: u32,
    pub block_number: u64,
    pub state_hash: String,
    pub forbidden_registries: usize,
    pub factories: usize,
    pub tlds: usize,
    pub domains: u64,
    pub resolvers: usize,
    pub metadata_providers: usize,
}

impl ChainSnapshot {
    /// Current snapshot format version
    pub const VERSION: u32 = 1;

    pub fn capture(block_number: u64, state: &ContractState) -> SnapshotResult<Self> {
        Ok(Self {
            version: Self::VERSION,
            block_number,
            state: state.clone(),
            state_hash: compute_state_hash(state)?,
        })
    }

    /// Check version and state hash
    pub fn verify(&self) -> SnapshotResult<()> {
        if self.version != Self::VERSION {
            return Err(SnapshotError::InvalidVersion(self.version));
        }
        let actual = compute_state_hash(&self.state)?;
        if actual != self.state_hash {
            return Err(SnapshotError::HashMismatch {
                expected: hex::encode(self.state_hash),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> SnapshotResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Decode and verify
    pub fn from_bytes(bytes: &[u8]) -> SnapshotResult<Self> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        snapshot.verify()?;
        Ok(snapshot)
    }

    pub fn summary(&self) -> SnapshotSummary {
        let contracts = &self.state.contracts;
        SnapshotSummary {
            version: self.version,
            block_number: self.block_number,
            state_hash: hex::encode(self.state_hash),
            forbidden_registries: contracts.forbidden.len(),
            factories: contracts.factories.len(),
            tlds: contracts.tlds.len(),
            domains: contracts.tlds.values().map(|tld| tld.total_supply()).sum(),
            resolvers: self.state.resolvers.len(),
            metadata_providers: contracts.metadata.len(),
        }
    }
}

pub fn compute_state_hash(state: &ContractState) -> SnapshotResult<[u8; 32]> {
    let encoded = bincode::serialize(state).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&encoded).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DomainChain;
    use crate::config::RegistryConfig;
    use crate::types::Address;

    fn chain_with_contracts() -> DomainChain {
        let mut chain = DomainChain::new(RegistryConfig::default());
        let owner = Address::from_low_u64(1);
        chain.deploy_forbidden_registry(owner).unwrap();
        chain.deploy_resolver(owner).unwrap();
        chain
    }

    #[test]
    fn test_snapshot_deterministic_hash() {
        let chain = chain_with_contracts();
        let a = chain.snapshot().unwrap();
        let b = chain.snapshot().unwrap();
        assert_eq!(a.state_hash, b.state_hash);
        assert!(a.verify().is_ok());
    }

    #[test]
    fn test_bytes_round_trip_verifies() {
        let chain = chain_with_contracts();
        let bytes = chain.snapshot().unwrap().to_bytes().unwrap();

        let decoded = ChainSnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.block_number, 2);
        assert_eq!(decoded.summary().resolvers, 1);
        assert_eq!(decoded.summary().forbidden_registries, 1);
    }

    #[test]
    fn test_tampered_state_fails() {
        let chain = chain_with_contracts();
        let mut snapshot = chain.snapshot().unwrap();
        snapshot.state.resolvers.clear();

        assert!(matches!(snapshot.verify(), Err(SnapshotError::HashMismatch { .. })));
    }

    #[test]
    fn test_invalid_version_fails() {
        let chain = chain_with_contracts();
        let mut snapshot = chain.snapshot().unwrap();
        snapshot.version = 999;

        assert!(matches!(snapshot.verify(), Err(SnapshotError::InvalidVersion(999))));
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(matches!(
            ChainSnapshot::from_bytes(&[1, 2, 3]),
            Err(SnapshotError::Serialization(_))
        ));
    }
}
