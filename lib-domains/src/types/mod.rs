//! Primitive types shared by every contract.

pub mod address;

pub use address::{Address, AddressParseError};

/// Native-coin amount in the smallest unit (18 decimals)
pub type Wei = u128;

/// NFT token identifier, unique within one TLD registry
pub type TokenId = u64;

/// Smallest units per whole native coin
pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// Basis-point denominator used for royalties
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Royalty ceiling: 50%
pub const MAX_ROYALTY_BPS: u16 = 5_000;

/// Convert a whole-coin amount expressed in thousandths into wei
///
/// `milli_ether(200)` is 0.2 of a coin.
pub const fn milli_ether(milli: u128) -> Wei {
    milli * (WEI_PER_ETHER / 1_000)
}

/// Convert whole coins into wei
pub const fn ether(whole: u128) -> Wei {
    whole * WEI_PER_ETHER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(ether(1), WEI_PER_ETHER);
        assert_eq!(milli_ether(1_000), ether(1));
        assert_eq!(milli_ether(900) + milli_ether(100), ether(1));
    }
}
