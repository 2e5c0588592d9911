//! # Allocation Subsystem
//!
//! One vesting record per recipient, ever. A record is created by the
//! issuing authority's `allocate`, released by the recipient's `claim`, and
//! never deleted.
//!
//! Records live in a sharded map; the entry guard for a recipient is held
//! for the whole operation, so two operations on the same recipient are
//! serialized while different recipients proceed in parallel and only meet
//! at the supply ledger's lock.

use crate::accounts::{TokenAccounts, TransferBatch};
use crate::error::{Result, TokenomicsError};
use crate::supply::SharedSupply;
use crate::types::{AccountId, Amount, Timestamp};
use crate::vesting::{AllocationCategory, VestingPolicy, VestingPolicyTable};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Per-recipient vesting record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Recipient identity (record key)
    pub recipient: AccountId,
    /// Category selecting the vesting policy
    pub category: AllocationCategory,
    /// Total commitment
    pub amount: Amount,
    /// Released to the recipient so far, TGE included
    pub claimed_amount: Amount,
    /// Vesting origin
    pub created_at: Timestamp,
}

impl Allocation {
    /// Total unlocked as of `now`
    pub fn vested_amount(&self, policy: &VestingPolicy, now: Timestamp) -> Result<Amount> {
        policy.vested_amount(self.amount, self.created_at, now)
    }

    /// Unlocked but not yet released
    pub fn claimable(&self, policy: &VestingPolicy, now: Timestamp) -> Result<Amount> {
        Ok(self
            .vested_amount(policy, now)?
            .saturating_sub(self.claimed_amount))
    }

    /// Still held back by the schedule or unclaimed
    pub fn unreleased(&self) -> Amount {
        self.amount - self.claimed_amount
    }

    pub fn is_fully_claimed(&self) -> bool {
        self.claimed_amount == self.amount
    }
}

/// All allocation records keyed by recipient
#[derive(Default)]
pub struct AllocationBook {
    records: DashMap<AccountId, Allocation>,
}

impl AllocationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `recipient`'s allocation and release its TGE share.
    ///
    /// Authorization is the caller's concern; this only enforces record
    /// uniqueness, the supply cap and the category policy.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        policies: &VestingPolicyTable,
        recipient: AccountId,
        category: AllocationCategory,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Allocation> {
        if amount == 0 {
            return Err(TokenomicsError::InvalidParameter(
                "allocation amount must be positive".into(),
            ));
        }

        let slot = match self.records.entry(recipient) {
            Entry::Occupied(_) => return Err(TokenomicsError::DuplicateAllocation(recipient)),
            Entry::Vacant(slot) => slot,
        };

        let policy = policies.policy_for(category);
        let tge_amount = policy.tge_amount(amount)?;

        supply.transact(|ledger| {
            ledger.reserve_allocation(amount)?;
            ledger.credit_circulating(tge_amount)?;
            accounts.create_account(recipient)?;
            accounts.execute(&TransferBatch::new().mint(recipient, tge_amount))?;
            Ok(())
        })?;

        let record = Allocation {
            recipient,
            category,
            amount,
            claimed_amount: tge_amount,
            created_at: now,
        };
        slot.insert(record.clone());

        tracing::info!(
            recipient = %recipient,
            category = category.key(),
            amount,
            tge_amount,
            "allocation created"
        );
        Ok(record)
    }

    /// Release everything vested since the last claim; returns the amount released
    pub fn claim(
        &self,
        supply: &SharedSupply,
        accounts: &dyn TokenAccounts,
        policies: &VestingPolicyTable,
        recipient: AccountId,
        now: Timestamp,
    ) -> Result<Amount> {
        let mut record = self
            .records
            .get_mut(&recipient)
            .ok_or(TokenomicsError::AllocationNotFound(recipient))?;

        let policy = policies.policy_for(record.category);
        let vested = record.vested_amount(policy, now)?;
        let delta = vested.saturating_sub(record.claimed_amount);
        if delta == 0 {
            return Err(TokenomicsError::NothingToClaim);
        }

        supply.transact(|ledger| {
            ledger.credit_circulating(delta)?;
            accounts.execute(&TransferBatch::new().mint(recipient, delta))?;
            Ok(())
        })?;
        record.claimed_amount = vested;

        tracing::info!(
            recipient = %recipient,
            released = delta,
            claimed_total = vested,
            remaining = record.unreleased(),
            "vested tokens claimed"
        );
        Ok(delta)
    }

    pub fn get(&self, recipient: &AccountId) -> Option<Allocation> {
        self.records.get(recipient).map(|r| r.value().clone())
    }

    pub fn contains(&self, recipient: &AccountId) -> bool {
        self.records.contains_key(recipient)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of every record, ordered by recipient
    pub fn records(&self) -> Vec<Allocation> {
        let mut all: Vec<Allocation> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|a| a.recipient);
        all
    }
}
