//! # Burn
//!
//! The issuing authority permanently removes tokens from circulation by
//! moving them from its own balance into the account model's burn sink.

use crate::accounts::{TokenAccounts, TransferBatch};
use crate::error::{Result, TokenomicsError};
use crate::supply::{SharedSupply, SupplySnapshot};
use crate::types::{AccountId, Amount};

/// Burn `amount` from the authority's balance.
///
/// The ledger check runs before the sink transfer: a burn above circulating
/// supply fails with `InsufficientCirculatingSupply` even when the
/// authority's balance is also short. `InsufficientBalance` is reported
/// only for burns the ledger would accept.
pub fn burn(
    supply: &SharedSupply,
    accounts: &dyn TokenAccounts,
    caller: AccountId,
    amount: Amount,
) -> Result<SupplySnapshot> {
    let snapshot = supply.transact(|ledger| {
        if caller != ledger.authority() {
            return Err(TokenomicsError::Unauthorized { caller });
        }
        if amount == 0 {
            return Err(TokenomicsError::InvalidParameter("burn amount must be positive".into()));
        }
        ledger.record_burn(amount)?;
        accounts.execute(&TransferBatch::new().burn_into_sink(caller, amount))?;
        Ok(ledger.snapshot())
    })?;

    tracing::info!(
        amount,
        burned_supply = snapshot.burned_supply,
        circulating_supply = snapshot.circulating_supply,
        "tokens burned"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::MemoryAccounts;

    fn setup() -> (SharedSupply, MemoryAccounts, AccountId) {
        let authority = AccountId::from_label("authority");
        let supply = SharedSupply::new();
        supply.initialize(authority, 1_000).unwrap();
        let accounts = MemoryAccounts::new();
        accounts.create_account(authority).unwrap();
        supply
            .transact(|l| {
                l.reserve_allocation(500)?;
                l.credit_circulating(300)?;
                accounts.mint(authority, 300)?;
                Ok(())
            })
            .unwrap();
        (supply, accounts, authority)
    }

    #[test]
    fn test_burn_updates_ledger_and_sink() {
        let (supply, accounts, authority) = setup();
        let snapshot = burn(&supply, &accounts, authority, 120).unwrap();

        assert_eq!(snapshot.burned_supply, 120);
        assert_eq!(snapshot.circulating_supply, 180);
        assert_eq!(accounts.sink_balance(), 120);
        assert_eq!(accounts.balance_of(&authority), Some(180));
    }

    #[test]
    fn test_only_authority_burns() {
        let (supply, accounts, _) = setup();
        let intruder = AccountId::from_label("intruder");
        assert_eq!(
            burn(&supply, &accounts, intruder, 1),
            Err(TokenomicsError::Unauthorized { caller: intruder })
        );
    }

    #[test]
    fn test_burn_rejections_change_nothing() {
        let (supply, accounts, authority) = setup();
        let before = supply.snapshot().unwrap();

        assert!(matches!(
            burn(&supply, &accounts, authority, 0),
            Err(TokenomicsError::InvalidParameter(_))
        ));
        assert_eq!(
            burn(&supply, &accounts, authority, 301),
            Err(TokenomicsError::InsufficientCirculatingSupply {
                requested: 301,
                available: 300,
            })
        );
        assert_eq!(supply.snapshot().unwrap(), before);
        assert_eq!(accounts.sink_balance(), 0);
    }

    #[test]
    fn test_burn_limited_by_authority_balance() {
        let (supply, accounts, authority) = setup();
        accounts.create_account(AccountId::from_label("holder")).unwrap();
        accounts.transfer(authority, AccountId::from_label("holder"), 250).unwrap();

        let err = burn(&supply, &accounts, authority, 100).unwrap_err();
        assert!(err.is_insufficient_balance());
        assert_eq!(supply.snapshot().unwrap().burned_supply, 0);
    }

    #[test]
    fn test_circulating_check_precedes_balance_check() {
        let (supply, accounts, authority) = setup();
        accounts.create_account(AccountId::from_label("holder")).unwrap();
        accounts.transfer(authority, AccountId::from_label("holder"), 250).unwrap();

        // Both limits are exceeded; the ledger reports first
        assert_eq!(
            burn(&supply, &accounts, authority, 400),
            Err(TokenomicsError::InsufficientCirculatingSupply {
                requested: 400,
                available: 300,
            })
        );
        assert_eq!(accounts.balance_of(&authority), Some(50));
    }
}
