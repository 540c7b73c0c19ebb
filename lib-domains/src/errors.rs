//! Contract revert reasons
//!
//! Every failed state-changing call surfaces exactly one of these variants.
//! The `Display` string is the caller-visible revert reason, so callers can
//! branch on either the variant or the message.
//!
//! Resolution misses (unknown TLD, unminted domain) are NOT errors; read paths
//! return `Address::ZERO` / empty strings instead.

use thiserror::Error;

use crate::types::{Address, TokenId, Wei};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    // ------------------------------------------------------------------
    // TLD creation (factory)
    // ------------------------------------------------------------------
    #[error("Buying TLDs disabled")]
    BuyingTldsDisabled,

    #[error("Value below price")]
    ValueBelowPrice { price: Wei, paid: Wei },

    #[error("Name must have 1 dot")]
    TldDotCount { dots: usize },

    #[error("Name must start with dot")]
    TldMissingLeadingDot,

    #[error("TLD too short")]
    TldTooShort { min: usize, actual: usize },

    #[error("TLD too long")]
    TldTooLong { max: usize, actual: usize },

    #[error("TLD already exists")]
    TldAlreadyExists { name: String },

    #[error("Forbidden TLD")]
    TldForbidden { name: String },

    #[error("Royalty cannot be more than 50%")]
    RoyaltyTooHigh { bps: u16 },

    // ------------------------------------------------------------------
    // Domain minting (TLD registry)
    // ------------------------------------------------------------------
    #[error("Buying domains disabled")]
    BuyingDomainsDisabled,

    #[error("Domain name empty")]
    DomainNameEmpty,

    #[error("Domain name is too long")]
    DomainNameTooLong { max: usize, actual: usize },

    #[error("There should be no dots in the name")]
    DomainNameHasDot,

    #[error("There should be no spaces in the name")]
    DomainNameHasSpace,

    #[error("Domain with this name already exists")]
    DomainAlreadyExists { name: String },

    #[error("Cannot change metadata address anymore")]
    MetadataFrozen,

    // ------------------------------------------------------------------
    // NFT ownership
    // ------------------------------------------------------------------
    #[error("ERC721: invalid token ID")]
    InvalidTokenId(TokenId),

    #[error("ERC721: mint to the zero address")]
    MintToZeroAddress,

    #[error("ERC721: transfer to the zero address")]
    TransferToZeroAddress,

    #[error("ERC721: transfer from incorrect owner")]
    TransferFromIncorrectOwner,

    #[error("ERC721: caller is not token owner or approved")]
    NotOwnerNorApproved,

    #[error("ERC721: approval to current owner")]
    ApprovalToCurrentOwner,

    #[error("ERC721: approve to caller")]
    ApproveToCaller,

    // ------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------
    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("Ownable: new owner is the zero address")]
    NewOwnerIsZero,

    #[error("Not owner or manager")]
    NotManager,

    #[error("Not allowed to grant factory access")]
    NotFactoryGranter,

    #[error("Only factory can add forbidden TLDs")]
    NotFactory,

    #[error("You do not own the selected domain")]
    NotDomainHolder { name: String },

    #[error("Sender not domain holder")]
    SenderNotDomainHolder,

    #[error("Caller is not royalty fee updater")]
    NotRoyaltyFeeUpdater,

    // ------------------------------------------------------------------
    // Resolver administration
    // ------------------------------------------------------------------
    #[error("Factory already added")]
    FactoryAlreadyAdded(Address),

    #[error("Factory not registered")]
    FactoryNotRegistered(Address),

    #[error("Address cannot be zero")]
    ZeroAddress,

    // ------------------------------------------------------------------
    // Execution environment
    // ------------------------------------------------------------------
    #[error("No contract at address {0}")]
    UnknownContract(Address),
}

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;
