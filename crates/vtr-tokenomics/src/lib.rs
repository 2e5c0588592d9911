//! # VTR Tokenomics
//!
//! Supply accounting, category vesting and time-locked staking for the VTR token.
//!
//! ## Key Features
//!
//! - **Fixed supply**: allocations are reserved against an immutable cap
//! - **Category vesting**: TGE unlock, cliff and linear vesting per category
//! - **Time-locked staking**: fixed-term stakes with APY yield on maturity
//! - **Burn accounting**: permanently destroyed supply tracked separately
//!
//! ## Canonical Distribution
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     VTR SUPPLY PARTITION (2B VTR)                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Token Sale:          400,000,000 VTR   (20%)                           │
//! │  Team & Advisors:     300,000,000 VTR   (15%)                           │
//! │  Ecosystem Growth:    500,000,000 VTR   (25%)                           │
//! │  Liquidity:           200,000,000 VTR   (10%)                           │
//! │  Platform Reserve:    300,000,000 VTR   (15%)                           │
//! │  Buyback & Burn:      200,000,000 VTR   (10%)                           │
//! │  Marketing:           100,000,000 VTR    (5%)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operation Flow
//!
//! | Operation | Caller | Ledger effect |
//! |-----------|--------|---------------|
//! | initialize | authority | creates the supply ledger |
//! | allocate | authority | `allocated += amount`, `circulating += tge` |
//! | claim | recipient | `circulating += newly vested` |
//! | stake | staker | none (principal moves into pool custody) |
//! | unstake | staker | reward policy dependent |
//! | burn | authority | `circulating -= amount`, `burned += amount` |

pub mod accounts;
pub mod allocation;
pub mod burn;
pub mod config;
pub mod engine;
pub mod error;
pub mod math;
pub mod staking;
pub mod supply;
pub mod types;
pub mod vesting;

// Re-exports
pub use accounts::{BalanceError, MemoryAccounts, TokenAccounts, TransferBatch, TransferOp};
pub use allocation::{Allocation, AllocationBook};
pub use config::{ConfigError, DistributionPlan, TokenomicsConfig};
pub use engine::TokenomicsEngine;
pub use error::{Result, TokenomicsError};
pub use staking::{RewardFunding, StakeRecord, StakingPool};
pub use supply::{SupplyLedger, SupplySnapshot};
pub use types::{AccountId, Amount, Timestamp};
pub use vesting::{AllocationCategory, VestingPolicy, VestingPolicyTable};

/// VTR token constants
pub mod constants {
    /// Token symbol
    pub const SYMBOL: &str = "VTR";

    /// Decimal places
    pub const DECIMALS: u8 = 9;

    /// One VTR in base units
    pub const ONE_VTR: u64 = 1_000_000_000; // 10^9

    /// Canonical total supply: 2 billion VTR
    pub const TOTAL_SUPPLY: u64 = 2_000_000_000 * ONE_VTR;

    /// 100% in basis points
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Seconds per day
    pub const SECONDS_PER_DAY: u64 = 24 * 3600;

    /// Seconds per 30-day month, the unit vesting schedules are written in
    pub const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;

    /// Seconds per Julian year (365.25 days), used for APY accrual
    pub const SECONDS_PER_YEAR: u64 = 31_557_600;
}

pub use constants::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_supply() {
        assert_eq!(TOTAL_SUPPLY, 2_000_000_000_000_000_000);
    }

    #[test]
    fn test_year_length() {
        assert_eq!(SECONDS_PER_YEAR, 365 * SECONDS_PER_DAY + 6 * 3600);
    }
}
