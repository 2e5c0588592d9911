//! # Vesting Policies
//!
//! Static mapping from allocation category to unlock schedule.
//!
//! ## Unlock Curve
//!
//! ```text
//!  vested
//!  amount ┤                              ┌──────────── amount
//!         │                           ╱
//!         │                        ╱      linear over vesting_duration
//!         │                     ╱
//!    tge  ┤───────────────────┘
//!         └──────┬────────────┬─────────┬──────────── time
//!            created_at    + cliff    + cliff + vesting
//! ```
//!
//! Adding a category means adding a variant and a table row; the unlock
//! arithmetic is shared by every category.

use crate::config::ConfigError;
use crate::constants::{BPS_DENOMINATOR, SECONDS_PER_MONTH};
use crate::error::Result;
use crate::math;
use crate::types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Allocation category of the distribution event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationCategory {
    /// Public and private token sale
    TokenSale,
    /// Team and advisors
    TeamAdvisors,
    /// Ecosystem growth fund
    EcosystemGrowth,
    /// Exchange liquidity
    Liquidity,
    /// Platform reserve
    PlatformReserve,
    /// Buyback and burn program
    BuybackBurn,
    /// Marketing
    Marketing,
}

impl AllocationCategory {
    pub const COUNT: usize = 7;

    /// Every category in table order
    pub const ALL: [AllocationCategory; Self::COUNT] = [
        Self::TokenSale,
        Self::TeamAdvisors,
        Self::EcosystemGrowth,
        Self::Liquidity,
        Self::PlatformReserve,
        Self::BuybackBurn,
        Self::Marketing,
    ];

    /// Row in the policy table
    pub fn index(&self) -> usize {
        match self {
            Self::TokenSale => 0,
            Self::TeamAdvisors => 1,
            Self::EcosystemGrowth => 2,
            Self::Liquidity => 3,
            Self::PlatformReserve => 4,
            Self::BuybackBurn => 5,
            Self::Marketing => 6,
        }
    }

    /// Configuration key
    pub fn key(&self) -> &'static str {
        match self {
            Self::TokenSale => "token_sale",
            Self::TeamAdvisors => "team_advisors",
            Self::EcosystemGrowth => "ecosystem_growth",
            Self::Liquidity => "liquidity",
            Self::PlatformReserve => "platform_reserve",
            Self::BuybackBurn => "buyback_burn",
            Self::Marketing => "marketing",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenSale => "Token Sale",
            Self::TeamAdvisors => "Team & Advisors",
            Self::EcosystemGrowth => "Ecosystem Growth",
            Self::Liquidity => "Liquidity",
            Self::PlatformReserve => "Platform Reserve",
            Self::BuybackBurn => "Buyback & Burn",
            Self::Marketing => "Marketing",
        }
    }
}

impl fmt::Display for AllocationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AllocationCategory {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.key() == normalized)
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// Unlock schedule of one category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPolicy {
    /// Share unlocked at allocation time (0-10000)
    pub tge_unlock_bps: u16,
    /// Seconds after allocation before linear vesting starts
    pub cliff_duration: u64,
    /// Seconds of linear vesting after the cliff; zero vests fully at the cliff
    pub vesting_duration: u64,
}

impl VestingPolicy {
    pub const fn new(tge_unlock_bps: u16, cliff_duration: u64, vesting_duration: u64) -> Self {
        Self {
            tge_unlock_bps,
            cliff_duration,
            vesting_duration,
        }
    }

    /// Policy with durations expressed in 30-day months
    pub const fn monthly(tge_unlock_bps: u16, cliff_months: u64, vesting_months: u64) -> Self {
        Self::new(
            tge_unlock_bps,
            cliff_months * SECONDS_PER_MONTH,
            vesting_months * SECONDS_PER_MONTH,
        )
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.tge_unlock_bps as u64 > BPS_DENOMINATOR {
            return Err(ConfigError::Invalid(format!(
                "tge_unlock_bps {} exceeds {}",
                self.tge_unlock_bps, BPS_DENOMINATOR
            )));
        }
        if i64::try_from(self.cliff_duration.saturating_add(self.vesting_duration)).is_err() {
            return Err(ConfigError::Invalid(
                "cliff plus vesting duration exceeds the timestamp range".into(),
            ));
        }
        Ok(())
    }

    /// Amount released immediately at allocation
    pub fn tge_amount(&self, amount: Amount) -> Result<Amount> {
        math::apply_bps(amount, self.tge_unlock_bps)
    }

    /// Total unlocked as of `now` for an allocation of `amount` created at
    /// `created_at`, whether or not it has been claimed.
    ///
    /// Non-decreasing in `now` and never above `amount`.
    pub fn vested_amount(
        &self,
        amount: Amount,
        created_at: Timestamp,
        now: Timestamp,
    ) -> Result<Amount> {
        let tge = self.tge_amount(amount)?;
        let since_created = math::seconds_since(now, created_at);
        if now < created_at || since_created < self.cliff_duration {
            return Ok(tge);
        }

        let post_tge = amount - tge;
        if self.vesting_duration == 0 {
            return Ok(amount);
        }

        let elapsed = (since_created - self.cliff_duration).min(self.vesting_duration);
        let linear = math::mul_div(post_tge, elapsed, self.vesting_duration, "vested_amount")?;
        math::add(tge, linear, "vested_amount")
    }

    /// Time at which the allocation is fully vested
    pub fn fully_vested_at(&self, created_at: Timestamp) -> Result<Timestamp> {
        let span = math::add(self.cliff_duration, self.vesting_duration, "fully_vested_at")?;
        math::offset(created_at, span, "fully_vested_at")
    }
}

/// One policy per category
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VestingPolicyTable {
    policies: [VestingPolicy; AllocationCategory::COUNT],
}

impl VestingPolicyTable {
    /// Build the table; every category must be configured exactly once
    pub fn from_entries(
        entries: impl IntoIterator<Item = (AllocationCategory, VestingPolicy)>,
    ) -> std::result::Result<Self, ConfigError> {
        let mut slots: [Option<VestingPolicy>; AllocationCategory::COUNT] =
            [None; AllocationCategory::COUNT];

        for (category, policy) in entries {
            policy.validate()?;
            let slot = &mut slots[category.index()];
            if slot.is_some() {
                return Err(ConfigError::Invalid(format!(
                    "category {} configured twice",
                    category.key()
                )));
            }
            *slot = Some(policy);
        }

        let mut policies = [VestingPolicy::new(0, 0, 0); AllocationCategory::COUNT];
        for category in AllocationCategory::ALL {
            policies[category.index()] = slots[category.index()]
                .ok_or(ConfigError::MissingCategory(category))?;
        }
        Ok(Self { policies })
    }

    /// Schedule of the deployed VTR program
    pub fn canonical() -> Self {
        Self {
            policies: [
                VestingPolicy::monthly(1000, 0, 12),  // Token Sale: 10% TGE
                VestingPolicy::monthly(0, 12, 36),    // Team & Advisors
                VestingPolicy::monthly(1500, 0, 48),  // Ecosystem Growth
                VestingPolicy::monthly(5000, 0, 6),   // Liquidity: 50% TGE
                VestingPolicy::monthly(500, 6, 60),   // Platform Reserve
                VestingPolicy::monthly(0, 0, 24),     // Buyback & Burn
                VestingPolicy::monthly(2000, 0, 18),  // Marketing
            ],
        }
    }

    pub fn policy_for(&self, category: AllocationCategory) -> &VestingPolicy {
        &self.policies[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AllocationCategory, &VestingPolicy)> {
        AllocationCategory::ALL
            .into_iter()
            .map(move |c| (c, self.policy_for(c)))
    }

    /// Keyed form used by configuration files
    pub fn to_map(&self) -> BTreeMap<AllocationCategory, VestingPolicy> {
        self.iter().map(|(c, p)| (c, *p)).collect()
    }
}

impl Default for VestingPolicyTable {
    fn default() -> Self {
        Self::canonical()
    }
}
