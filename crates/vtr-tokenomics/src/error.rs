//! Error types for ledger operations

use crate::accounts::BalanceError;
use crate::types::{AccountId, Amount, Timestamp};
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, TokenomicsError>;

/// Errors returned by ledger operations.
///
/// Every error leaves the ledger, the touched record and the external
/// balances exactly as they were before the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenomicsError {
    // === Lifecycle ===
    /// Singleton created twice
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    /// Singleton used before creation
    #[error("{0} not initialized")]
    NotInitialized(&'static str),

    /// Caller is not the issuing authority
    #[error("Caller {caller} is not the issuing authority")]
    Unauthorized { caller: AccountId },

    /// Rejected input value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // === Allocation ===
    /// Recipient already holds an allocation
    #[error("Allocation already exists for recipient {0}")]
    DuplicateAllocation(AccountId),

    /// Recipient has no allocation
    #[error("No allocation for recipient {0}")]
    AllocationNotFound(AccountId),

    /// Allocation would exceed total supply
    #[error("Supply cap exceeded: requested {requested}, unallocated {available}")]
    SupplyCapExceeded { requested: Amount, available: Amount },

    /// Nothing newly vested since the last claim
    #[error("No tokens to claim")]
    NothingToClaim,

    // === Burn ===
    /// Burn larger than circulating supply
    #[error("Insufficient circulating supply: requested {requested}, circulating {available}")]
    InsufficientCirculatingSupply { requested: Amount, available: Amount },

    // === Staking ===
    /// Requested lock shorter than the pool minimum
    #[error("Stake duration {duration}s below pool minimum {minimum}s")]
    StakeDurationTooShort { duration: u64, minimum: u64 },

    /// Staker already has an open stake
    #[error("Staker {0} already has an active stake")]
    ActiveStakeExists(AccountId),

    /// Staker has no open stake
    #[error("No active stake for staker {0}")]
    StakeNotFound(AccountId),

    /// Unstake attempted before unlock time
    #[error("Stake locked until {unlock_time}")]
    StakeNotMatured { unlock_time: Timestamp },

    // === Collaborator ===
    /// Error from the external balance model, propagated unchanged
    #[error(transparent)]
    Balance(#[from] BalanceError),

    // === Fatal ===
    /// Checked arithmetic overflowed; indicates a logic or configuration defect
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Internal accounting invariant would be broken
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(&'static str),
}

impl TokenomicsError {
    /// Stable numeric code for transports
    pub fn code(&self) -> u32 {
        match self {
            Self::AlreadyInitialized(_) => 1001,
            Self::NotInitialized(_) => 1002,
            Self::Unauthorized { .. } => 1003,
            Self::InvalidParameter(_) => 1004,
            Self::DuplicateAllocation(_) => 2001,
            Self::AllocationNotFound(_) => 2002,
            Self::SupplyCapExceeded { .. } => 2003,
            Self::NothingToClaim => 2004,
            Self::InsufficientCirculatingSupply { .. } => 3001,
            Self::StakeDurationTooShort { .. } => 4001,
            Self::ActiveStakeExists(_) => 4002,
            Self::StakeNotFound(_) => 4003,
            Self::StakeNotMatured { .. } => 4004,
            Self::Balance(BalanceError::InsufficientBalance { .. }) => 5001,
            Self::Balance(_) => 5002,
            Self::ArithmeticOverflow(_) => 9001,
            Self::InvariantViolation(_) => 9002,
        }
    }

    /// Fatal errors signal a defect, not a user condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ArithmeticOverflow(_) | Self::InvariantViolation(_))
    }

    /// Caller could not fund the operation
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, Self::Balance(BalanceError::InsufficientBalance { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TokenomicsError::NothingToClaim.code(), 2004);
        assert_eq!(TokenomicsError::ArithmeticOverflow("x").code(), 9001);

        let err = TokenomicsError::from(BalanceError::InsufficientBalance {
            account: AccountId::new([1u8; 32]),
            required: 10,
            available: 5,
        });
        assert_eq!(err.code(), 5001);
        assert!(err.is_insufficient_balance());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(TokenomicsError::ArithmeticOverflow("reserve").is_fatal());
        assert!(TokenomicsError::InvariantViolation("circulating").is_fatal());
        assert!(!TokenomicsError::NothingToClaim.is_fatal());
        assert!(!TokenomicsError::StakeNotMatured { unlock_time: 10 }.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = TokenomicsError::SupplyCapExceeded {
            requested: 10,
            available: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Supply cap exceeded"));
        assert!(msg.contains("unallocated 3"));
    }
}
