//! Property tests for vesting and supply accounting

use proptest::prelude::*;
use std::sync::Arc;
use vtr_tokenomics::{
    AccountId, AllocationCategory, MemoryAccounts, RewardFunding, TokenomicsEngine,
    VestingPolicy, VestingPolicyTable, SECONDS_PER_DAY,
};

const TEN_YEARS: u64 = 10 * 365 * SECONDS_PER_DAY;

fn policy() -> impl Strategy<Value = VestingPolicy> {
    (0u16..=10_000, 0..TEN_YEARS, 0..TEN_YEARS)
        .prop_map(|(bps, cliff, duration)| VestingPolicy::new(bps, cliff, duration))
}

fn category() -> impl Strategy<Value = AllocationCategory> {
    prop::sample::select(AllocationCategory::ALL.to_vec())
}

#[derive(Clone, Debug)]
enum Op {
    Allocate { who: u8, category: AllocationCategory, amount: u64 },
    Claim { who: u8 },
    Burn { amount: u64 },
    Stake { who: u8, amount: u64, days: u64 },
    Unstake { who: u8 },
    Advance { seconds: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8, category(), 1u64..400_000)
            .prop_map(|(who, category, amount)| Op::Allocate { who, category, amount }),
        (0u8..9).prop_map(|who| Op::Claim { who }),
        (1u64..50_000).prop_map(|amount| Op::Burn { amount }),
        (0u8..9, 1u64..50_000, 0u64..120)
            .prop_map(|(who, amount, days)| Op::Stake { who, amount, days }),
        (0u8..9).prop_map(|who| Op::Unstake { who }),
        (0..2 * 365 * SECONDS_PER_DAY).prop_map(|seconds| Op::Advance { seconds }),
    ]
}

/// Participant 0 is the authority; the rest are plain holders
fn participant(who: u8) -> AccountId {
    if who == 0 {
        AccountId::from_label("authority")
    } else {
        AccountId::from_label(&format!("holder-{}", who))
    }
}

proptest! {
    #[test]
    fn vested_amount_is_monotone_and_bounded(
        policy in policy(),
        amount in 0u64..=u64::MAX / 2,
        created_at in -1_000_000_000i64..2_000_000_000,
        a in 0u64..2 * TEN_YEARS,
        b in 0u64..2 * TEN_YEARS,
    ) {
        let (early, late) = (a.min(b) as i64, a.max(b) as i64);
        let tge = policy.tge_amount(amount).unwrap();

        let v1 = policy.vested_amount(amount, created_at, created_at + early).unwrap();
        let v2 = policy.vested_amount(amount, created_at, created_at + late).unwrap();

        prop_assert!(tge <= v1);
        prop_assert!(v1 <= v2);
        prop_assert!(v2 <= amount);
    }

    #[test]
    fn fully_vested_after_schedule(policy in policy(), amount in 0u64..=u64::MAX / 2) {
        let end = policy.fully_vested_at(0).unwrap();
        prop_assert_eq!(policy.vested_amount(amount, 0, end).unwrap(), amount);
    }

    #[test]
    fn before_creation_only_tge(
        policy in policy(),
        amount in 0u64..1_000_000_000,
        back in 1i64..1_000_000,
    ) {
        let tge = policy.tge_amount(amount).unwrap();
        prop_assert_eq!(policy.vested_amount(amount, 0, -back).unwrap(), tge);
    }

    #[test]
    fn supply_invariants_hold_for_any_sequence(ops in prop::collection::vec(op(), 1..60)) {
        let accounts = Arc::new(MemoryAccounts::new());
        let engine = TokenomicsEngine::new(VestingPolicyTable::canonical(), accounts.clone());
        let authority = participant(0);
        engine.initialize(authority, 1_000_000).unwrap();
        engine
            .initialize_pool(authority, 1500, 30 * SECONDS_PER_DAY, RewardFunding::MintNewSupply)
            .unwrap();

        let mut now: i64 = 0;
        for op in ops {
            let before = engine.supply().unwrap();
            let outcome = match op {
                Op::Allocate { who, category, amount } => engine
                    .allocate(authority, participant(who), category, amount, now)
                    .map(|_| ()),
                Op::Claim { who } => engine.claim(participant(who), now).map(|_| ()),
                Op::Burn { amount } => engine.burn(authority, amount).map(|_| ()),
                Op::Stake { who, amount, days } => engine
                    .stake(participant(who), amount, days * SECONDS_PER_DAY, now)
                    .map(|_| ()),
                Op::Unstake { who } => engine.unstake(participant(who), now).map(|_| ()),
                Op::Advance { seconds } => {
                    now += seconds as i64;
                    Ok(())
                }
            };

            let after = engine.supply().unwrap();
            if let Err(err) = outcome {
                prop_assert!(!err.is_fatal(), "fatal error {:?}", err);
                prop_assert_eq!(after, before);
            }

            prop_assert!(after.allocated_supply <= after.total_supply);
            prop_assert!(after.circulating_supply as u128 + after.burned_supply as u128
                <= after.allocated_supply as u128);
            prop_assert_eq!(accounts.total_minted(), after.issued);
            prop_assert_eq!(accounts.sink_balance(), after.burned_supply);
            prop_assert_eq!(accounts.total_held(), after.circulating_supply as u128);

            let pool = engine.pool().unwrap();
            let open: u64 = (0..9u8)
                .filter_map(|who| engine.stake_of(&participant(who)))
                .map(|s| s.amount)
                .sum();
            prop_assert_eq!(pool.total_staked, open);
        }
    }
}
