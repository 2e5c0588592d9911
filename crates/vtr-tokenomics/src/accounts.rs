//! # External Token Accounts
//!
//! The conventional token-account model the ledger moves tokens through.
//! The ledger never stores holder balances itself; it describes each
//! operation's token movements as a [`TransferBatch`] and hands the batch to
//! a [`TokenAccounts`] implementation, which must apply it all-or-nothing.
//!
//! [`MemoryAccounts`] is the in-process reference implementation used by the
//! CLI and the tests.

use crate::types::{AccountId, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by the account model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient balance in {account}: required {required}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Balance overflow in account {0}")]
    Overflow(AccountId),
}

/// A single token movement
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOp {
    /// Move existing tokens between accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    /// Create new tokens in an account
    Mint { to: AccountId, amount: Amount },
    /// Move tokens out of an account into the irrecoverable sink
    BurnIntoSink { from: AccountId, amount: Amount },
}

/// Ordered token movements applied atomically
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferBatch {
    ops: Vec<TransferOp>,
}

impl TransferBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer; zero amounts are dropped
    pub fn transfer(mut self, from: AccountId, to: AccountId, amount: Amount) -> Self {
        if amount > 0 {
            self.ops.push(TransferOp::Transfer { from, to, amount });
        }
        self
    }

    /// Append a mint; zero amounts are dropped
    pub fn mint(mut self, to: AccountId, amount: Amount) -> Self {
        if amount > 0 {
            self.ops.push(TransferOp::Mint { to, amount });
        }
        self
    }

    /// Append a burn; zero amounts are dropped
    pub fn burn_into_sink(mut self, from: AccountId, amount: Amount) -> Self {
        if amount > 0 {
            self.ops.push(TransferOp::BurnIntoSink { from, amount });
        }
        self
    }

    pub fn ops(&self) -> &[TransferOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Token account capability consumed by the ledger
pub trait TokenAccounts: Send + Sync {
    /// Create an empty account; a no-op if it already exists
    fn create_account(&self, owner: AccountId) -> Result<(), BalanceError>;

    /// Current balance, `None` for unknown accounts
    fn balance_of(&self, owner: &AccountId) -> Option<Amount>;

    /// Apply every op in order, or none of them
    fn execute(&self, batch: &TransferBatch) -> Result<(), BalanceError>;

    fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), BalanceError> {
        self.execute(&TransferBatch::new().transfer(from, to, amount))
    }

    fn mint(&self, to: AccountId, amount: Amount) -> Result<(), BalanceError> {
        self.execute(&TransferBatch::new().mint(to, amount))
    }

    fn burn_into_sink(&self, from: AccountId, amount: Amount) -> Result<(), BalanceError> {
        self.execute(&TransferBatch::new().burn_into_sink(from, amount))
    }
}

#[derive(Default)]
struct AccountState {
    balances: HashMap<AccountId, Amount>,
    minted: Amount,
    sunk: Amount,
}

/// In-memory token accounts
#[derive(Default)]
pub struct MemoryAccounts {
    state: RwLock<AccountState>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total tokens ever minted
    pub fn total_minted(&self) -> Amount {
        self.state.read().minted
    }

    /// Tokens held by the burn sink
    pub fn sink_balance(&self) -> Amount {
        self.state.read().sunk
    }

    /// Sum of all account balances (excludes the sink)
    pub fn total_held(&self) -> u128 {
        self.state.read().balances.values().map(|b| *b as u128).sum()
    }
}

impl TokenAccounts for MemoryAccounts {
    fn create_account(&self, owner: AccountId) -> Result<(), BalanceError> {
        self.state.write().balances.entry(owner).or_insert(0);
        Ok(())
    }

    fn balance_of(&self, owner: &AccountId) -> Option<Amount> {
        self.state.read().balances.get(owner).copied()
    }

    fn execute(&self, batch: &TransferBatch) -> Result<(), BalanceError> {
        let mut state = self.state.write();

        // Stage against an overlay; nothing touches `state` until every op passed
        let mut staged: HashMap<AccountId, Amount> = HashMap::new();
        let mut minted = state.minted;
        let mut sunk = state.sunk;

        let current = |staged: &HashMap<AccountId, Amount>, id: &AccountId| {
            staged
                .get(id)
                .or_else(|| state.balances.get(id))
                .copied()
                .ok_or(BalanceError::AccountNotFound(*id))
        };

        for op in batch.ops() {
            match *op {
                TransferOp::Transfer { from, to, amount } => {
                    let available = current(&staged, &from)?;
                    let debited = available.checked_sub(amount).ok_or(
                        BalanceError::InsufficientBalance {
                            account: from,
                            required: amount,
                            available,
                        },
                    )?;
                    staged.insert(from, debited);
                    let credited = current(&staged, &to)?
                        .checked_add(amount)
                        .ok_or(BalanceError::Overflow(to))?;
                    staged.insert(to, credited);
                }
                TransferOp::Mint { to, amount } => {
                    let credited = current(&staged, &to)?
                        .checked_add(amount)
                        .ok_or(BalanceError::Overflow(to))?;
                    staged.insert(to, credited);
                    minted = minted.checked_add(amount).ok_or(BalanceError::Overflow(to))?;
                }
                TransferOp::BurnIntoSink { from, amount } => {
                    let available = current(&staged, &from)?;
                    let debited = available.checked_sub(amount).ok_or(
                        BalanceError::InsufficientBalance {
                            account: from,
                            required: amount,
                            available,
                        },
                    )?;
                    staged.insert(from, debited);
                    sunk = sunk.checked_add(amount).ok_or(BalanceError::Overflow(from))?;
                }
            }
        }

        state.balances.extend(staged);
        state.minted = minted;
        state.sunk = sunk;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    #[test]
    fn test_mint_and_transfer() {
        let accounts = MemoryAccounts::new();
        accounts.create_account(id(1)).unwrap();
        accounts.create_account(id(2)).unwrap();

        accounts.mint(id(1), 100).unwrap();
        accounts.transfer(id(1), id(2), 40).unwrap();

        assert_eq!(accounts.balance_of(&id(1)), Some(60));
        assert_eq!(accounts.balance_of(&id(2)), Some(40));
        assert_eq!(accounts.total_minted(), 100);
    }

    #[test]
    fn test_create_account_is_idempotent() {
        let accounts = MemoryAccounts::new();
        accounts.create_account(id(1)).unwrap();
        accounts.mint(id(1), 5).unwrap();
        accounts.create_account(id(1)).unwrap();
        assert_eq!(accounts.balance_of(&id(1)), Some(5));
    }

    #[test]
    fn test_failed_batch_applies_nothing() {
        let accounts = MemoryAccounts::new();
        accounts.create_account(id(1)).unwrap();
        accounts.create_account(id(2)).unwrap();
        accounts.mint(id(1), 50).unwrap();

        let batch = TransferBatch::new()
            .transfer(id(1), id(2), 30)
            .burn_into_sink(id(1), 30); // only 20 left after the transfer

        let err = accounts.execute(&batch).unwrap_err();
        assert_eq!(
            err,
            BalanceError::InsufficientBalance {
                account: id(1),
                required: 30,
                available: 20,
            }
        );
        assert_eq!(accounts.balance_of(&id(1)), Some(50));
        assert_eq!(accounts.balance_of(&id(2)), Some(0));
        assert_eq!(accounts.sink_balance(), 0);
    }

    #[test]
    fn test_unknown_account_rejected() {
        let accounts = MemoryAccounts::new();
        assert_eq!(
            accounts.mint(id(9), 1),
            Err(BalanceError::AccountNotFound(id(9)))
        );
        assert_eq!(accounts.total_minted(), 0);
    }

    #[test]
    fn test_burn_into_sink() {
        let accounts = MemoryAccounts::new();
        accounts.create_account(id(1)).unwrap();
        accounts.mint(id(1), 10).unwrap();
        accounts.burn_into_sink(id(1), 4).unwrap();

        assert_eq!(accounts.balance_of(&id(1)), Some(6));
        assert_eq!(accounts.sink_balance(), 4);
        assert_eq!(accounts.total_held(), 6);
    }

    #[test]
    fn test_zero_amount_ops_dropped() {
        let batch = TransferBatch::new().mint(id(1), 0).transfer(id(1), id(2), 0);
        assert!(batch.is_empty());
    }
}
