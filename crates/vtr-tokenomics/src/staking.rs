//! # Staking System
//!
//! Fixed-term, time-locked staking with simple APY yield.
//!
//! ## Stake Lifecycle
//!
//! | Step | Condition | Effect |
//! |------|-----------|--------|
//! | stake | `duration >= min_stake_duration`, no open stake | principal → vault, reward fixed |
//! | unstake | `now >= unlock_time` | principal + reward → staker, record closed |
//!
//! Reward, fixed when the stake opens:
//!
//! ```text
//! reward = floor(amount * apy_bps * (unlock_time - stake_time) / (10000 * SECONDS_PER_YEAR))
//! ```
//!
//! Where the reward comes from is the pool's [`RewardFunding`] policy. A
//! stake whose reward cannot be computed or funded is refused up front, so
//! every open stake can be closed once it matures.

use crate::accounts::{TokenAccounts, TransferBatch};
use crate::constants::{BPS_DENOMINATOR, SECONDS_PER_YEAR};
use crate::error::{Result, TokenomicsError};
use crate::math;
use crate::supply::SharedSupply;
use crate::types::{seeds, AccountId, Amount, Timestamp};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Source of staking rewards
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardFunding {
    /// Reward is new supply: reserved against the cap when the stake opens,
    /// credited to circulating and minted to the staker when it closes
    #[default]
    MintNewSupply,
    /// Reward is paid out of an already-circulating reserve account
    PrefundedReserve { reserve: AccountId },
}

impl RewardFunding {
    /// Open a stake: move the principal and, for minted rewards, reserve the
    /// reward against the supply cap in the same step
    fn open(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        principal: TransferBatch,
        reward: Amount,
    ) -> Result<()> {
        match self {
            Self::MintNewSupply => supply.transact(|ledger| {
                ledger.reserve_allocation(reward)?;
                accounts.execute(&principal)?;
                Ok(())
            }),
            Self::PrefundedReserve { .. } => {
                accounts.execute(&principal)?;
                Ok(())
            }
        }
    }

    /// Close a stake: return `principal` together with the reward payment
    fn settle(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        principal: TransferBatch,
        staker: AccountId,
        reward: Amount,
    ) -> Result<()> {
        match self {
            Self::MintNewSupply => supply.transact(|ledger| {
                ledger.credit_circulating(reward)?;
                accounts.execute(&principal.mint(staker, reward))?;
                Ok(())
            }),
            Self::PrefundedReserve { reserve } => {
                accounts.execute(&principal.transfer(*reserve, staker, reward))?;
                Ok(())
            }
        }
    }
}

/// Pool-level staking state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    /// Issuing authority that created the pool
    pub authority: AccountId,
    /// Annual yield in basis points
    pub apy_bps: u16,
    /// Shortest lock a stake may request, in seconds
    pub min_stake_duration: u64,
    /// Principal of all open stakes
    pub total_staked: Amount,
    /// Account holding staked principal
    pub vault: AccountId,
    /// Reward source
    pub reward_funding: RewardFunding,
}

/// One staker's open stake
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub staker: AccountId,
    /// Principal
    pub amount: Amount,
    pub stake_time: Timestamp,
    pub unlock_time: Timestamp,
    /// Paid on unstake
    pub reward: Amount,
}

impl StakeRecord {
    /// Lock length in seconds
    pub fn duration(&self) -> u64 {
        math::seconds_since(self.unlock_time, self.stake_time)
    }

    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.unlock_time
    }
}

/// floor(amount * apy_bps * duration / (10000 * SECONDS_PER_YEAR))
pub fn staking_reward(amount: Amount, apy_bps: u16, duration: u64) -> Result<Amount> {
    let numerator = (amount as u128)
        .checked_mul(apy_bps as u128)
        .and_then(|n| n.checked_mul(duration as u128))
        .ok_or(TokenomicsError::ArithmeticOverflow("staking_reward"))?;
    let reward = numerator / (BPS_DENOMINATOR as u128 * SECONDS_PER_YEAR as u128);
    Amount::try_from(reward).map_err(|_| TokenomicsError::ArithmeticOverflow("staking_reward"))
}

/// Principal and reward returned by `unstake`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unstaked {
    pub principal: Amount,
    pub reward: Amount,
}

impl Unstaked {
    pub fn total(&self) -> Amount {
        self.principal.saturating_add(self.reward)
    }
}

/// Staking pool singleton plus open stakes keyed by staker.
///
/// Lock order: stake entry, then pool, then (for minted rewards) the
/// supply ledger.
#[derive(Default)]
pub struct StakingDesk {
    pool: Mutex<Option<StakingPool>>,
    stakes: DashMap<AccountId, StakeRecord>,
}

impl StakingDesk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the pool singleton and its vault account
    pub fn initialize_pool(
        &self,
        accounts: &dyn TokenAccounts,
        authority: AccountId,
        apy_bps: u16,
        min_stake_duration: u64,
        reward_funding: RewardFunding,
    ) -> Result<StakingPool> {
        let mut guard = self.pool.lock();
        if guard.is_some() {
            return Err(TokenomicsError::AlreadyInitialized("staking pool"));
        }
        if apy_bps == 0 {
            return Err(TokenomicsError::InvalidParameter("apy_bps must be positive".into()));
        }
        if min_stake_duration == 0 || i64::try_from(min_stake_duration).is_err() {
            return Err(TokenomicsError::InvalidParameter(
                "min_stake_duration must be a positive number of seconds".into(),
            ));
        }

        let vault = AccountId::derive(seeds::STAKING_VAULT, &authority);
        accounts.create_account(vault)?;

        let pool = StakingPool {
            authority,
            apy_bps,
            min_stake_duration,
            total_staked: 0,
            vault,
            reward_funding,
        };
        *guard = Some(pool.clone());

        tracing::info!(
            apy_bps,
            min_stake_duration,
            vault = %vault,
            funding = ?pool.reward_funding,
            "staking pool initialized"
        );
        Ok(pool)
    }

    /// Lock `amount` of the staker's tokens for `duration` seconds
    pub fn stake(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        staker: AccountId,
        amount: Amount,
        duration: u64,
        now: Timestamp,
    ) -> Result<StakeRecord> {
        if amount == 0 {
            return Err(TokenomicsError::InvalidParameter("stake amount must be positive".into()));
        }

        let entry = self.stakes.entry(staker);
        let mut guard = self.pool.lock();
        let pool = guard
            .as_mut()
            .ok_or(TokenomicsError::NotInitialized("staking pool"))?;

        if duration < pool.min_stake_duration {
            return Err(TokenomicsError::StakeDurationTooShort {
                duration,
                minimum: pool.min_stake_duration,
            });
        }
        let slot = match entry {
            Entry::Occupied(_) => return Err(TokenomicsError::ActiveStakeExists(staker)),
            Entry::Vacant(slot) => slot,
        };

        let unlock_time = math::offset(now, duration, "stake unlock_time").map_err(|_| {
            TokenomicsError::InvalidParameter(format!("stake duration {}s out of range", duration))
        })?;
        let reward = staking_reward(amount, pool.apy_bps, duration).map_err(|_| {
            TokenomicsError::InvalidParameter(format!(
                "reward for {} staked over {}s out of range",
                amount, duration
            ))
        })?;
        let total_staked = math::add(pool.total_staked, amount, "total_staked")?;

        let principal = TransferBatch::new().transfer(staker, pool.vault, amount);
        pool.reward_funding.open(supply, accounts, principal, reward)?;
        pool.total_staked = total_staked;

        let record = StakeRecord {
            staker,
            amount,
            stake_time: now,
            unlock_time,
            reward,
        };
        slot.insert(record.clone());

        tracing::info!(
            staker = %staker,
            amount,
            unlock_time,
            reward,
            total_staked,
            "stake opened"
        );
        Ok(record)
    }

    /// Close a matured stake, paying principal plus reward
    pub fn unstake(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        staker: AccountId,
        now: Timestamp,
    ) -> Result<Unstaked> {
        let entry = match self.stakes.entry(staker) {
            Entry::Vacant(_) => return Err(TokenomicsError::StakeNotFound(staker)),
            Entry::Occupied(entry) => entry,
        };
        let record = entry.get().clone();
        if !record.is_matured(now) {
            return Err(TokenomicsError::StakeNotMatured {
                unlock_time: record.unlock_time,
            });
        }

        let mut guard = self.pool.lock();
        let pool = guard
            .as_mut()
            .ok_or(TokenomicsError::NotInitialized("staking pool"))?;

        let reward = record.reward;
        let total_staked = math::sub(pool.total_staked, record.amount, "total_staked")?;

        let principal = TransferBatch::new().transfer(pool.vault, staker, record.amount);
        pool.reward_funding
            .settle(supply, accounts, principal, staker, reward)?;

        pool.total_staked = total_staked;
        entry.remove();

        tracing::info!(
            staker = %staker,
            principal = record.amount,
            reward,
            total_staked,
            "stake closed"
        );
        Ok(Unstaked {
            principal: record.amount,
            reward,
        })
    }

    pub fn pool(&self) -> Option<StakingPool> {
        self.pool.lock().clone()
    }

    pub fn stake_of(&self, staker: &AccountId) -> Option<StakeRecord> {
        self.stakes.get(staker).map(|r| r.value().clone())
    }

    /// Reward the staker's open stake will pay at maturity
    pub fn pending_reward(&self, staker: &AccountId) -> Result<Amount> {
        self.stakes
            .get(staker)
            .map(|r| r.reward)
            .ok_or(TokenomicsError::StakeNotFound(*staker))
    }

    pub fn active_stakes(&self) -> usize {
        self.stakes.len()
    }
}
