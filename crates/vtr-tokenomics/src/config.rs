//! Distribution configuration
//!
//! Everything the engine is parameterized by: total supply, the vesting
//! policy of each category, the staking pool and the planned distribution.
//! The engine itself never reads files or the environment; callers load a
//! [`TokenomicsConfig`] and pass explicit values in.

use crate::constants::{DECIMALS, ONE_VTR, SECONDS_PER_DAY, SYMBOL, TOTAL_SUPPLY};
use crate::staking::RewardFunding;
use crate::types::{AccountId, Amount};
use crate::vesting::{AllocationCategory, VestingPolicy, VestingPolicyTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration errors, raised at startup rather than during operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("No vesting policy configured for category {}", .0.key())]
    MissingCategory(AllocationCategory),

    #[error("Unknown allocation category: {0}")]
    UnknownCategory(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenomicsConfig {
    /// Token settings
    #[serde(default)]
    pub token: TokenConfig,

    /// One entry per allocation category
    #[serde(default = "default_vesting")]
    pub vesting: Vec<CategoryPolicy>,

    /// Staking pool parameters
    #[serde(default)]
    pub staking: StakingConfig,

    /// Planned allocations of the distribution event
    #[serde(default = "default_distribution")]
    pub distribution: Vec<PlannedAllocation>,
}

/// Token settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub decimals: u8,
    /// Fixed supply in base units
    pub total_supply: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
            total_supply: TOTAL_SUPPLY,
        }
    }
}

/// Vesting policy row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub category: AllocationCategory,
    #[serde(flatten)]
    pub policy: VestingPolicy,
}

/// Staking pool parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Annual yield in basis points
    pub apy_bps: u16,
    /// Minimum lock in seconds
    pub min_stake_duration: u64,
    /// Defaults to paying from the platform reserve recipient
    #[serde(default = "default_reward_funding")]
    pub reward_funding: RewardFunding,
}

fn default_reward_funding() -> RewardFunding {
    RewardFunding::PrefundedReserve {
        reserve: AccountId::from_label(AllocationCategory::PlatformReserve.key()),
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            apy_bps: 1500,                            // 15% APY
            min_stake_duration: 30 * SECONDS_PER_DAY, // 30 days
            reward_funding: default_reward_funding(),
        }
    }
}

/// One allocation of the distribution event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAllocation {
    pub category: AllocationCategory,
    pub recipient: AccountId,
    pub amount: Amount,
}

fn default_vesting() -> Vec<CategoryPolicy> {
    VestingPolicyTable::canonical()
        .iter()
        .map(|(category, policy)| CategoryPolicy {
            category,
            policy: *policy,
        })
        .collect()
}

fn default_distribution() -> Vec<PlannedAllocation> {
    let share = |category: AllocationCategory, tokens: u64| PlannedAllocation {
        category,
        recipient: AccountId::from_label(category.key()),
        amount: tokens * ONE_VTR,
    };
    vec![
        share(AllocationCategory::TokenSale, 400_000_000),
        share(AllocationCategory::TeamAdvisors, 300_000_000),
        share(AllocationCategory::EcosystemGrowth, 500_000_000),
        share(AllocationCategory::Liquidity, 200_000_000),
        share(AllocationCategory::PlatformReserve, 300_000_000),
        share(AllocationCategory::BuybackBurn, 200_000_000),
        share(AllocationCategory::Marketing, 100_000_000),
    ]
}

impl Default for TokenomicsConfig {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            vesting: default_vesting(),
            staking: StakingConfig::default(),
            distribution: default_distribution(),
        }
    }
}

impl TokenomicsConfig {
    /// Load a TOML file, with `VTR__SECTION__KEY` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::Load(format!("non UTF-8 path: {:?}", path)))?;

        let config: Self = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Toml).required(true))
            .add_source(
                config::Environment::with_prefix("VTR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject configurations the engine could not run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.total_supply == 0 {
            return Err(ConfigError::Invalid("token.total_supply must be positive".into()));
        }
        if self.staking.apy_bps == 0 {
            return Err(ConfigError::Invalid("staking.apy_bps must be positive".into()));
        }
        if self.staking.min_stake_duration == 0 {
            return Err(ConfigError::Invalid(
                "staking.min_stake_duration must be positive".into(),
            ));
        }
        self.vesting_table()?;
        self.distribution_plan()?;
        Ok(())
    }

    pub fn vesting_table(&self) -> Result<VestingPolicyTable, ConfigError> {
        VestingPolicyTable::from_entries(self.vesting.iter().map(|row| (row.category, row.policy)))
    }

    pub fn distribution_plan(&self) -> Result<DistributionPlan, ConfigError> {
        DistributionPlan::new(self.token.total_supply, self.distribution.clone())
    }
}

/// Validated list of allocations for the distribution event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributionPlan {
    total_supply: Amount,
    allocations: Vec<PlannedAllocation>,
}

impl DistributionPlan {
    /// Allocations must have distinct recipients and, when present, sum to
    /// exactly `total_supply`
    pub fn new(
        total_supply: Amount,
        allocations: Vec<PlannedAllocation>,
    ) -> Result<Self, ConfigError> {
        let mut recipients = HashSet::new();
        let mut sum: u128 = 0;

        for planned in &allocations {
            if planned.amount == 0 {
                return Err(ConfigError::Invalid(format!(
                    "planned {} allocation is zero",
                    planned.category.key()
                )));
            }
            if !recipients.insert(planned.recipient) {
                return Err(ConfigError::Invalid(format!(
                    "recipient {} planned twice",
                    planned.recipient
                )));
            }
            sum += planned.amount as u128;
        }

        if !allocations.is_empty() && sum != total_supply as u128 {
            return Err(ConfigError::Invalid(format!(
                "distribution sums to {} but total supply is {}",
                sum, total_supply
            )));
        }

        Ok(Self {
            total_supply,
            allocations,
        })
    }

    pub fn allocations(&self) -> &[PlannedAllocation] {
        &self.allocations
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Planned amount for a category
    pub fn amount_for(&self, category: AllocationCategory) -> Amount {
        self.allocations
            .iter()
            .filter(|a| a.category == category)
            .map(|a| a.amount)
            .sum()
    }

    /// Share of total supply in basis points
    pub fn share_bps(&self, category: AllocationCategory) -> u64 {
        if self.total_supply == 0 {
            return 0;
        }
        (self.amount_for(category) as u128 * 10_000 / self.total_supply as u128) as u64
    }
}
