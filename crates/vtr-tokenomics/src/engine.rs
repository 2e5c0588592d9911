//! # Tokenomics Engine
//!
//! Entry point for every operation. Callers arrive already authenticated;
//! the engine checks that the identity is allowed to perform the operation
//! and dispatches to the owning subsystem.
//!
//! | Operation | Allowed caller |
//! |-----------|----------------|
//! | `initialize` | anyone, once; becomes the issuing authority |
//! | `initialize_pool`, `allocate`, `burn` | issuing authority |
//! | `claim` | the recipient itself |
//! | `stake`, `unstake` | the staker itself |
//!
//! Time is always an argument; the engine never reads a clock.

use crate::accounts::TokenAccounts;
use crate::allocation::{Allocation, AllocationBook};
use crate::burn;
use crate::config::{ConfigError, DistributionPlan, TokenomicsConfig};
use crate::error::{Result, TokenomicsError};
use crate::staking::{RewardFunding, StakeRecord, StakingDesk, StakingPool, Unstaked};
use crate::supply::{SharedSupply, SupplySnapshot};
use crate::types::{AccountId, Amount, Timestamp};
use crate::vesting::{AllocationCategory, VestingPolicyTable};
use std::sync::Arc;

/// Log rejected operations; fatal errors at `error`, the rest at `debug`
fn observe<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if err.is_fatal() {
            tracing::error!(operation, error = %err, code = err.code(), "operation failed");
        } else {
            tracing::debug!(operation, error = %err, code = err.code(), "operation rejected");
        }
    }
    result
}

/// The distribution ledger
pub struct TokenomicsEngine {
    policies: VestingPolicyTable,
    accounts: Arc<dyn TokenAccounts>,
    supply: SharedSupply,
    allocations: AllocationBook,
    staking: StakingDesk,
}

impl TokenomicsEngine {
    pub fn new(policies: VestingPolicyTable, accounts: Arc<dyn TokenAccounts>) -> Self {
        Self {
            policies,
            accounts,
            supply: SharedSupply::new(),
            allocations: AllocationBook::new(),
            staking: StakingDesk::new(),
        }
    }

    /// Engine with the configured vesting table
    pub fn from_config(
        config: &TokenomicsConfig,
        accounts: Arc<dyn TokenAccounts>,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(config.vesting_table()?, accounts))
    }

    fn require_authority(&self, caller: AccountId) -> Result<AccountId> {
        let authority = self.supply.authority()?;
        if caller != authority {
            return Err(TokenomicsError::Unauthorized { caller });
        }
        Ok(authority)
    }

    // === Lifecycle ===

    /// Create the supply ledger; `caller` becomes the issuing authority.
    ///
    /// The authority's account is created first so a failing account model
    /// leaves the ledger uninitialized.
    pub fn initialize(&self, caller: AccountId, total_supply: Amount) -> Result<SupplySnapshot> {
        let result = self
            .accounts
            .create_account(caller)
            .map_err(TokenomicsError::from)
            .and_then(|_| self.supply.initialize(caller, total_supply));
        if let Ok(snapshot) = &result {
            tracing::info!(
                authority = %caller,
                total_supply = snapshot.total_supply,
                "supply ledger initialized"
            );
        }
        observe("initialize", result)
    }

    /// Create the staking pool
    pub fn initialize_pool(
        &self,
        caller: AccountId,
        apy_bps: u16,
        min_stake_duration: u64,
        reward_funding: RewardFunding,
    ) -> Result<StakingPool> {
        let result = self.require_authority(caller).and_then(|authority| {
            self.staking.initialize_pool(
                self.accounts.as_ref(),
                authority,
                apy_bps,
                min_stake_duration,
                reward_funding,
            )
        });
        observe("initialize_pool", result)
    }

    // === Allocation ===

    /// Commit `amount` to `recipient` under `category`'s vesting policy
    pub fn allocate(
        &self,
        caller: AccountId,
        recipient: AccountId,
        category: AllocationCategory,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Allocation> {
        let result = self.require_authority(caller).and_then(|_| {
            self.allocations.allocate(
                &self.supply,
                self.accounts.as_ref(),
                &self.policies,
                recipient,
                category,
                amount,
                now,
            )
        });
        observe("allocate", result)
    }

    /// Release the caller's newly vested tokens
    pub fn claim(&self, caller: AccountId, now: Timestamp) -> Result<Amount> {
        let result = self.allocations.claim(
            &self.supply,
            self.accounts.as_ref(),
            &self.policies,
            caller,
            now,
        );
        observe("claim", result)
    }

    /// Allocate every entry of a plan in order, stopping at the first failure.
    ///
    /// Each allocation commits on its own; entries before a failure stay.
    pub fn run_distribution(
        &self,
        caller: AccountId,
        plan: &DistributionPlan,
        now: Timestamp,
    ) -> Result<Vec<Allocation>> {
        plan.allocations()
            .iter()
            .map(|planned| {
                self.allocate(caller, planned.recipient, planned.category, planned.amount, now)
            })
            .collect()
    }

    // === Staking ===

    pub fn stake(
        &self,
        caller: AccountId,
        amount: Amount,
        duration: u64,
        now: Timestamp,
    ) -> Result<StakeRecord> {
        let result = self.staking.stake(
            &self.supply,
            self.accounts.as_ref(),
            caller,
            amount,
            duration,
            now,
        );
        observe("stake", result)
    }

    pub fn unstake(&self, caller: AccountId, now: Timestamp) -> Result<Unstaked> {
        let result = self
            .staking
            .unstake(&self.supply, self.accounts.as_ref(), caller, now);
        observe("unstake", result)
    }

    // === Burn ===

    pub fn burn(&self, caller: AccountId, amount: Amount) -> Result<SupplySnapshot> {
        let result = burn::burn(&self.supply, self.accounts.as_ref(), caller, amount);
        observe("burn", result)
    }

    // === Queries ===

    pub fn supply(&self) -> Option<SupplySnapshot> {
        self.supply.snapshot()
    }

    pub fn allocation(&self, recipient: &AccountId) -> Option<Allocation> {
        self.allocations.get(recipient)
    }

    /// All allocation records, ordered by recipient
    pub fn allocations(&self) -> Vec<Allocation> {
        self.allocations.records()
    }

    /// Total unlocked for `recipient` as of `now`
    pub fn vested_amount(&self, recipient: &AccountId, now: Timestamp) -> Result<Amount> {
        let record = self
            .allocations
            .get(recipient)
            .ok_or(TokenomicsError::AllocationNotFound(*recipient))?;
        record.vested_amount(self.policies.policy_for(record.category), now)
    }

    /// What a claim at `now` would release
    pub fn claimable(&self, recipient: &AccountId, now: Timestamp) -> Result<Amount> {
        let record = self
            .allocations
            .get(recipient)
            .ok_or(TokenomicsError::AllocationNotFound(*recipient))?;
        record.claimable(self.policies.policy_for(record.category), now)
    }

    pub fn pool(&self) -> Option<StakingPool> {
        self.staking.pool()
    }

    pub fn stake_of(&self, staker: &AccountId) -> Option<StakeRecord> {
        self.staking.stake_of(staker)
    }

    pub fn pending_reward(&self, staker: &AccountId) -> Result<Amount> {
        self.staking.pending_reward(staker)
    }

    pub fn active_stakes(&self) -> usize {
        self.staking.active_stakes()
    }

    pub fn policies(&self) -> &VestingPolicyTable {
        &self.policies
    }

    pub fn accounts(&self) -> &Arc<dyn TokenAccounts> {
        &self.accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{BalanceError, MemoryAccounts, TransferBatch};
    use crate::constants::{ONE_VTR, SECONDS_PER_DAY};

    fn engine() -> (TokenomicsEngine, AccountId) {
        let engine = TokenomicsEngine::new(
            VestingPolicyTable::canonical(),
            Arc::new(MemoryAccounts::new()),
        );
        let authority = AccountId::from_label("authority");
        engine.initialize(authority, 1_000_000 * ONE_VTR).unwrap();
        (engine, authority)
    }

    #[test]
    fn test_initialize_once() {
        let (engine, authority) = engine();
        assert_eq!(
            engine.initialize(authority, 1),
            Err(TokenomicsError::AlreadyInitialized("supply ledger"))
        );
        assert_eq!(engine.accounts().balance_of(&authority), Some(0));
    }

    /// Account model whose every account creation fails
    struct RejectingAccounts;

    impl TokenAccounts for RejectingAccounts {
        fn create_account(&self, owner: AccountId) -> std::result::Result<(), BalanceError> {
            Err(BalanceError::AccountNotFound(owner))
        }

        fn balance_of(&self, _owner: &AccountId) -> Option<Amount> {
            None
        }

        fn execute(&self, _batch: &TransferBatch) -> std::result::Result<(), BalanceError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_initialize_leaves_ledger_unset() {
        let engine =
            TokenomicsEngine::new(VestingPolicyTable::canonical(), Arc::new(RejectingAccounts));
        let authority = AccountId::from_label("authority");

        assert_eq!(
            engine.initialize(authority, 1_000),
            Err(TokenomicsError::Balance(BalanceError::AccountNotFound(authority)))
        );
        assert!(engine.supply().is_none());
        assert_eq!(
            engine.burn(authority, 1),
            Err(TokenomicsError::NotInitialized("supply ledger"))
        );
    }

    #[test]
    fn test_operations_before_initialize() {
        let engine = TokenomicsEngine::new(
            VestingPolicyTable::canonical(),
            Arc::new(MemoryAccounts::new()),
        );
        let someone = AccountId::from_label("someone");
        assert_eq!(
            engine.allocate(someone, someone, AllocationCategory::TokenSale, 1, 0),
            Err(TokenomicsError::NotInitialized("supply ledger"))
        );
        assert!(engine.supply().is_none());
    }

    #[test]
    fn test_only_authority_allocates() {
        let (engine, _) = engine();
        let intruder = AccountId::from_label("intruder");
        assert_eq!(
            engine.allocate(intruder, intruder, AllocationCategory::TokenSale, ONE_VTR, 0),
            Err(TokenomicsError::Unauthorized { caller: intruder })
        );
        assert_eq!(engine.supply().unwrap().allocated_supply, 0);
    }

    #[test]
    fn test_only_authority_creates_pool() {
        let (engine, authority) = engine();
        let intruder = AccountId::from_label("intruder");
        assert_eq!(
            engine.initialize_pool(intruder, 1500, SECONDS_PER_DAY, RewardFunding::MintNewSupply),
            Err(TokenomicsError::Unauthorized { caller: intruder })
        );
        let pool = engine
            .initialize_pool(authority, 1500, SECONDS_PER_DAY, RewardFunding::MintNewSupply)
            .unwrap();
        assert_eq!(pool.authority, authority);
    }

    #[test]
    fn test_claim_is_keyed_by_caller() {
        let (engine, authority) = engine();
        let alice = AccountId::from_label("alice");
        let bob = AccountId::from_label("bob");
        engine
            .allocate(authority, alice, AllocationCategory::BuybackBurn, 1_000 * ONE_VTR, 0)
            .unwrap();

        // Bob cannot claim Alice's tokens; his own identity has no record
        assert_eq!(
            engine.claim(bob, i64::MAX),
            Err(TokenomicsError::AllocationNotFound(bob))
        );
        assert_eq!(engine.claim(alice, i64::MAX).unwrap(), 1_000 * ONE_VTR);
    }

    #[test]
    fn test_queries() {
        let (engine, authority) = engine();
        let alice = AccountId::from_label("alice");
        engine
            .allocate(authority, alice, AllocationCategory::Liquidity, 100 * ONE_VTR, 0)
            .unwrap();

        assert_eq!(engine.vested_amount(&alice, 0).unwrap(), 50 * ONE_VTR);
        assert_eq!(engine.claimable(&alice, 0).unwrap(), 0);
        assert_eq!(engine.allocations().len(), 1);
        assert!(engine.pool().is_none());
        assert!(matches!(
            engine.pending_reward(&alice),
            Err(TokenomicsError::StakeNotFound(_))
        ));
    }
}
