//! # Supply Ledger
//!
//! Process-wide aggregate accounting for the fixed VTR supply.
//!
//! ```text
//!  total_supply ─────────────────────────────────────────────────┐
//!  allocated_supply ──────────────────────────────┐              │
//!  circulating_supply + burned_supply ───┐        │              │
//!                                        ▼        ▼              ▼
//!  |■■■■■■■■■■ issued ■■■■■■■■■■■■■■■■■■■|▒ vesting ▒|  unallocated  |
//! ```
//!
//! `circulating_supply` is held net of burns: a burn moves tokens from
//! circulating to burned, so `circulating + burned` is everything that has
//! ever been released to holders and never exceeds `allocated_supply`.
//!
//! All four counters live in one struct behind one lock ([`SharedSupply`]);
//! invariants span all of them.

use crate::error::{Result, TokenomicsError};
use crate::math;
use crate::types::{AccountId, Amount};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Aggregate supply counters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLedger {
    /// Issuing authority that created the ledger
    authority: AccountId,
    /// Fixed at creation
    total_supply: Amount,
    /// Sum of all allocation commitments
    allocated_supply: Amount,
    /// Released to holders, net of burns
    circulating_supply: Amount,
    /// Permanently destroyed
    burned_supply: Amount,
}

/// Read-only view of the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplySnapshot {
    pub authority: AccountId,
    pub total_supply: Amount,
    pub allocated_supply: Amount,
    pub circulating_supply: Amount,
    pub burned_supply: Amount,
    /// `total_supply - allocated_supply`
    pub unallocated: Amount,
    /// `circulating_supply + burned_supply`
    pub issued: Amount,
}

impl SupplyLedger {
    /// Create a ledger with nothing allocated
    pub fn new(authority: AccountId, total_supply: Amount) -> Result<Self> {
        if total_supply == 0 {
            return Err(TokenomicsError::InvalidParameter(
                "total supply must be positive".into(),
            ));
        }
        Ok(Self {
            authority,
            total_supply,
            allocated_supply: 0,
            circulating_supply: 0,
            burned_supply: 0,
        })
    }

    pub fn authority(&self) -> AccountId {
        self.authority
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn allocated_supply(&self) -> Amount {
        self.allocated_supply
    }

    pub fn circulating_supply(&self) -> Amount {
        self.circulating_supply
    }

    pub fn burned_supply(&self) -> Amount {
        self.burned_supply
    }

    /// Supply not yet committed to any allocation
    pub fn unallocated(&self) -> Amount {
        self.total_supply.saturating_sub(self.allocated_supply)
    }

    /// Everything ever released to holders
    pub fn issued(&self) -> Amount {
        self.circulating_supply.saturating_add(self.burned_supply)
    }

    /// Commit `amount` of the remaining supply to a recipient
    pub fn reserve_allocation(&mut self, amount: Amount) -> Result<()> {
        let allocated = math::add(self.allocated_supply, amount, "reserve_allocation")?;
        if allocated > self.total_supply {
            return Err(TokenomicsError::SupplyCapExceeded {
                requested: amount,
                available: self.unallocated(),
            });
        }
        self.allocated_supply = allocated;
        Ok(())
    }

    /// Record tokens released to a holder.
    ///
    /// Callers only release vested portions of reserved allocations, so
    /// exceeding `allocated_supply` here is a defect, not a user error.
    pub fn credit_circulating(&mut self, amount: Amount) -> Result<()> {
        let circulating = math::add(self.circulating_supply, amount, "credit_circulating")?;
        let issued = math::add(circulating, self.burned_supply, "credit_circulating")?;
        if issued > self.allocated_supply {
            return Err(TokenomicsError::InvariantViolation(
                "circulating supply would exceed allocated supply",
            ));
        }
        self.circulating_supply = circulating;
        Ok(())
    }

    /// Move `amount` from circulating to burned
    pub fn record_burn(&mut self, amount: Amount) -> Result<()> {
        if amount > self.circulating_supply {
            return Err(TokenomicsError::InsufficientCirculatingSupply {
                requested: amount,
                available: self.circulating_supply,
            });
        }
        self.burned_supply = math::add(self.burned_supply, amount, "record_burn")?;
        self.circulating_supply -= amount;
        Ok(())
    }

    /// Verify the cross-counter invariants
    pub fn check_invariants(&self) -> Result<()> {
        if self.allocated_supply > self.total_supply {
            return Err(TokenomicsError::InvariantViolation(
                "allocated supply exceeds total supply",
            ));
        }
        let issued = math::add(self.circulating_supply, self.burned_supply, "check_invariants")?;
        if issued > self.allocated_supply {
            return Err(TokenomicsError::InvariantViolation(
                "issued supply exceeds allocated supply",
            ));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> SupplySnapshot {
        SupplySnapshot {
            authority: self.authority,
            total_supply: self.total_supply,
            allocated_supply: self.allocated_supply,
            circulating_supply: self.circulating_supply,
            burned_supply: self.burned_supply,
            unallocated: self.unallocated(),
            issued: self.issued(),
        }
    }
}

/// The singleton ledger behind its single lock.
///
/// Mutations go through [`SharedSupply::transact`], which runs against a
/// staged copy and writes it back only if the closure and the invariant
/// check both succeed.
#[derive(Default)]
pub struct SharedSupply {
    ledger: Mutex<Option<SupplyLedger>>,
}

impl SharedSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the singleton ledger
    pub fn initialize(&self, authority: AccountId, total_supply: Amount) -> Result<SupplySnapshot> {
        let mut guard = self.ledger.lock();
        if guard.is_some() {
            return Err(TokenomicsError::AlreadyInitialized("supply ledger"));
        }
        let ledger = SupplyLedger::new(authority, total_supply)?;
        let snapshot = ledger.snapshot();
        *guard = Some(ledger);
        Ok(snapshot)
    }

    pub fn is_initialized(&self) -> bool {
        self.ledger.lock().is_some()
    }

    pub fn snapshot(&self) -> Option<SupplySnapshot> {
        self.ledger.lock().as_ref().map(SupplyLedger::snapshot)
    }

    /// The issuing authority recorded at initialization
    pub fn authority(&self) -> Result<AccountId> {
        self.ledger
            .lock()
            .as_ref()
            .map(SupplyLedger::authority)
            .ok_or(TokenomicsError::NotInitialized("supply ledger"))
    }

    /// Run `f` as one atomic read-modify-write of the ledger.
    ///
    /// `f` may perform the operation's external transfer batch: the lock is
    /// held until it returns, and a failure anywhere discards the staged copy.
    pub fn transact<T>(&self, f: impl FnOnce(&mut SupplyLedger) -> Result<T>) -> Result<T> {
        let mut guard = self.ledger.lock();
        let current = guard
            .as_ref()
            .ok_or(TokenomicsError::NotInitialized("supply ledger"))?;

        let mut staged = current.clone();
        let result = f(&mut staged).and_then(|out| {
            staged.check_invariants()?;
            Ok(out)
        });

        match result {
            Ok(out) => {
                *guard = Some(staged);
                Ok(out)
            }
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(
                        error = %err,
                        code = err.code(),
                        "supply ledger transaction aborted"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(total: Amount) -> SupplyLedger {
        SupplyLedger::new(AccountId::new([1u8; 32]), total).unwrap()
    }

    #[test]
    fn test_reserve_within_cap() {
        let mut l = ledger(1_000);
        l.reserve_allocation(600).unwrap();
        l.reserve_allocation(400).unwrap();
        assert_eq!(l.allocated_supply(), 1_000);
        assert_eq!(l.unallocated(), 0);
    }

    #[test]
    fn test_reserve_over_cap_rejected() {
        let mut l = ledger(1_000);
        l.reserve_allocation(900).unwrap();
        assert_eq!(
            l.reserve_allocation(101),
            Err(TokenomicsError::SupplyCapExceeded {
                requested: 101,
                available: 100,
            })
        );
        assert_eq!(l.allocated_supply(), 900);
    }

    #[test]
    fn test_reserve_overflow_is_fatal() {
        let mut l = ledger(u64::MAX);
        l.reserve_allocation(u64::MAX).unwrap();
        let err = l.reserve_allocation(1).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_credit_beyond_allocated_is_invariant_violation() {
        let mut l = ledger(1_000);
        l.reserve_allocation(100).unwrap();
        l.credit_circulating(100).unwrap();
        assert!(matches!(
            l.credit_circulating(1),
            Err(TokenomicsError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_burn_moves_circulating_to_burned() {
        let mut l = ledger(1_000);
        l.reserve_allocation(500).unwrap();
        l.credit_circulating(300).unwrap();
        l.record_burn(100).unwrap();

        assert_eq!(l.circulating_supply(), 200);
        assert_eq!(l.burned_supply(), 100);
        assert_eq!(l.issued(), 300);
        l.check_invariants().unwrap();
    }

    #[test]
    fn test_burn_more_than_circulating_rejected() {
        let mut l = ledger(1_000);
        l.reserve_allocation(500).unwrap();
        l.credit_circulating(50).unwrap();
        assert_eq!(
            l.record_burn(51),
            Err(TokenomicsError::InsufficientCirculatingSupply {
                requested: 51,
                available: 50,
            })
        );
        assert_eq!(l.burned_supply(), 0);
    }

    #[test]
    fn test_burned_tokens_cannot_be_recredited_past_allocation() {
        let mut l = ledger(1_000);
        l.reserve_allocation(100).unwrap();
        l.credit_circulating(100).unwrap();
        l.record_burn(100).unwrap();
        assert!(l.credit_circulating(1).is_err());
    }

    #[test]
    fn test_zero_total_supply_rejected() {
        assert!(matches!(
            SupplyLedger::new(AccountId::default(), 0),
            Err(TokenomicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_shared_initialize_once() {
        let shared = SharedSupply::new();
        assert!(!shared.is_initialized());
        shared.initialize(AccountId::new([1u8; 32]), 10).unwrap();
        assert_eq!(
            shared.initialize(AccountId::new([1u8; 32]), 10),
            Err(TokenomicsError::AlreadyInitialized("supply ledger"))
        );
    }

    #[test]
    fn test_transact_discards_on_failure() {
        let shared = SharedSupply::new();
        shared.initialize(AccountId::new([1u8; 32]), 1_000).unwrap();

        let result: Result<()> = shared.transact(|l| {
            l.reserve_allocation(500)?;
            Err(TokenomicsError::NothingToClaim)
        });
        assert!(result.is_err());
        assert_eq!(shared.snapshot().unwrap().allocated_supply, 0);

        shared.transact(|l| l.reserve_allocation(500)).unwrap();
        assert_eq!(shared.snapshot().unwrap().allocated_supply, 500);
    }

    #[test]
    fn test_transact_requires_initialization() {
        let shared = SharedSupply::new();
        assert_eq!(
            shared.transact(|l| l.reserve_allocation(1)),
            Err(TokenomicsError::NotInitialized("supply ledger"))
        );
    }
}
