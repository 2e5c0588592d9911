//! VTR CLI
//!
//! Drives the distribution ledger against the in-memory account model with
//! an explicit simulated clock.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vtr_tokenomics::{
    AccountId, AllocationCategory, Amount, MemoryAccounts, SupplySnapshot, Timestamp,
    TokenAccounts, TokenomicsConfig, TokenomicsEngine, TokenomicsError, ONE_VTR,
    SECONDS_PER_DAY, SECONDS_PER_MONTH, SYMBOL,
};

#[derive(Parser)]
#[command(name = "vtr")]
#[command(version)]
#[command(about = "VTR token distribution ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the canonical VTR setup)
    #[arg(short, long, global = true, env = "VTR_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the distribution event and report supply over time
    Simulate {
        /// Genesis time (RFC 3339)
        #[arg(long, default_value = "2025-01-01T00:00:00Z")]
        genesis: String,

        /// Months after genesis at which every recipient claims
        #[arg(long, value_delimiter = ',', default_value = "1,6,12,24,48,72")]
        claim_months: Vec<u32>,

        /// Tokens the liquidity recipient stakes at genesis
        #[arg(long, default_value = "100000")]
        stake_tokens: u64,

        /// Stake lock in days
        #[arg(long, default_value = "90")]
        stake_days: u64,

        /// Tokens bought back and burned after the last claim
        #[arg(long, default_value = "1000000")]
        burn_tokens: u64,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a category's unlock curve
    Schedule {
        /// Category key, e.g. token_sale
        category: String,

        /// Allocation size in whole tokens (defaults to the planned amount)
        #[arg(long)]
        tokens: Option<u64>,

        /// Months between rows
        #[arg(long, default_value = "3")]
        step: u32,

        /// Genesis time (RFC 3339)
        #[arg(long, default_value = "2025-01-01T00:00:00Z")]
        genesis: String,
    },

    /// Print the effective configuration
    Config,
}

fn init_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false),
            )
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TokenomicsConfig> {
    match path {
        Some(path) => TokenomicsConfig::load(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(TokenomicsConfig::default()),
    }
}

fn parse_time(value: &str) -> anyhow::Result<Timestamp> {
    let time = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("invalid RFC 3339 time: {}", value))?;
    Ok(time.timestamp())
}

fn format_time(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Base units as whole tokens with the fractional part trimmed
fn format_vtr(amount: Amount) -> String {
    let whole = amount / ONE_VTR;
    let frac = amount % ONE_VTR;
    if frac == 0 {
        format!("{} {}", whole, SYMBOL)
    } else {
        let digits = format!("{:09}", frac);
        format!("{}.{} {}", whole, digits.trim_end_matches('0'), SYMBOL)
    }
}

fn month_offset(genesis: Timestamp, months: u32) -> Timestamp {
    genesis + months as i64 * SECONDS_PER_MONTH as i64
}

#[derive(Serialize)]
struct SimulationReport {
    genesis: Timestamp,
    supply: SupplySnapshot,
    allocations: Vec<AllocationReport>,
    total_staked: Amount,
}

#[derive(Serialize)]
struct AllocationReport {
    category: AllocationCategory,
    recipient: AccountId,
    amount: Amount,
    claimed_amount: Amount,
    balance: Amount,
}

fn print_supply(label: &str, supply: &SupplySnapshot) {
    println!("{}", label);
    println!("  allocated:   {}", format_vtr(supply.allocated_supply));
    println!("  circulating: {}", format_vtr(supply.circulating_supply));
    println!("  burned:      {}", format_vtr(supply.burned_supply));
    println!("  unallocated: {}", format_vtr(supply.unallocated));
}

fn simulate(
    config: &TokenomicsConfig,
    genesis: Timestamp,
    claim_months: &[u32],
    stake_amount: Amount,
    stake_days: u64,
    burn_amount: Amount,
) -> anyhow::Result<SimulationReport> {
    let accounts = Arc::new(MemoryAccounts::new());
    let engine = TokenomicsEngine::from_config(config, accounts.clone())?;
    let authority = AccountId::from_label("authority");
    tracing::info!(
        genesis = %format_time(genesis),
        total_supply = config.token.total_supply,
        allocations = config.distribution.len(),
        "starting simulation"
    );

    engine.initialize(authority, config.token.total_supply)?;
    engine.initialize_pool(
        authority,
        config.staking.apy_bps,
        config.staking.min_stake_duration,
        config.staking.reward_funding.clone(),
    )?;

    let plan = config.distribution_plan()?;
    engine.run_distribution(authority, &plan, genesis)?;
    print_supply(&format!("TGE ({})", format_time(genesis)), &engine.supply().context("ledger")?);

    // Sample stake from the first liquidity recipient
    let staker = plan
        .allocations()
        .iter()
        .find(|a| a.category == AllocationCategory::Liquidity)
        .map(|a| a.recipient);
    let stake = match staker {
        Some(staker) if stake_amount > 0 => {
            Some(engine.stake(staker, stake_amount, stake_days * SECONDS_PER_DAY, genesis)?)
        }
        _ => None,
    };

    let mut months = claim_months.to_vec();
    months.sort_unstable();
    for month in months {
        let now = month_offset(genesis, month);
        for planned in plan.allocations() {
            match engine.claim(planned.recipient, now) {
                Ok(_) | Err(TokenomicsError::NothingToClaim) => {}
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(record) = &stake {
            if record.is_matured(now) && engine.stake_of(&record.staker).is_some() {
                let out = engine.unstake(record.staker, now)?;
                println!(
                    "Unstaked {} + {} reward",
                    format_vtr(out.principal),
                    format_vtr(out.reward)
                );
            }
        }

        print_supply(
            &format!("Month {} ({})", month, format_time(now)),
            &engine.supply().context("ledger")?,
        );
    }

    // Buyback: the buyback recipient hands tokens to the authority, which burns them
    if burn_amount > 0 {
        let buyback = plan
            .allocations()
            .iter()
            .find(|a| a.category == AllocationCategory::BuybackBurn)
            .map(|a| a.recipient);
        match buyback {
            Some(buyback) => {
                accounts.transfer(buyback, authority, burn_amount)?;
                let supply = engine.burn(authority, burn_amount)?;
                print_supply(&format!("After burning {}", format_vtr(burn_amount)), &supply);
            }
            None => bail!("no buyback_burn allocation to fund the burn"),
        }
    }

    let allocations = engine
        .allocations()
        .into_iter()
        .map(|a| AllocationReport {
            category: a.category,
            recipient: a.recipient,
            amount: a.amount,
            claimed_amount: a.claimed_amount,
            balance: accounts.balance_of(&a.recipient).unwrap_or(0),
        })
        .collect();

    Ok(SimulationReport {
        genesis,
        supply: engine.supply().context("ledger")?,
        allocations,
        total_staked: engine.pool().map(|p| p.total_staked).unwrap_or(0),
    })
}

fn schedule(
    config: &TokenomicsConfig,
    category: AllocationCategory,
    tokens: Option<u64>,
    step: u32,
    genesis: Timestamp,
) -> anyhow::Result<()> {
    if step == 0 {
        bail!("--step must be positive");
    }
    let policy = *config.vesting_table()?.policy_for(category);
    let amount = match tokens {
        Some(tokens) => tokens
            .checked_mul(ONE_VTR)
            .context("allocation size overflows")?,
        None => config.distribution_plan()?.amount_for(category),
    };
    if amount == 0 {
        bail!("no planned {} allocation; pass --tokens", category.key());
    }

    let end = policy.fully_vested_at(genesis)?;
    println!("{} schedule for {}", category.name(), format_vtr(amount));
    println!(
        "  TGE {} bps, cliff {} days, vesting {} days",
        policy.tge_unlock_bps,
        policy.cliff_duration / SECONDS_PER_DAY,
        policy.vesting_duration / SECONDS_PER_DAY
    );
    println!("{:>6}  {:<10}  {:>28}  {:>7}", "month", "date", "vested", "pct");

    let mut month = 0;
    loop {
        let now = month_offset(genesis, month);
        let vested = policy.vested_amount(amount, genesis, now)?;
        let pct = vested as f64 * 100.0 / amount as f64;
        println!(
            "{:>6}  {:<10}  {:>28}  {:>6.2}%",
            month,
            format_time(now),
            format_vtr(vested),
            pct
        );
        if now >= end {
            break;
        }
        month += step;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Simulate {
            genesis,
            claim_months,
            stake_tokens,
            stake_days,
            burn_tokens,
            json,
        } => {
            let genesis = parse_time(&genesis)?;
            let stake_amount = stake_tokens.checked_mul(ONE_VTR).context("stake size overflows")?;
            let burn_amount = burn_tokens.checked_mul(ONE_VTR).context("burn size overflows")?;

            let report = simulate(
                &config,
                genesis,
                &claim_months,
                stake_amount,
                stake_days,
                burn_amount,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!();
                println!("{:<18}  {:>28}  {:>28}", "category", "allocated", "claimed");
                for a in &report.allocations {
                    println!(
                        "{:<18}  {:>28}  {:>28}",
                        a.category.key(),
                        format_vtr(a.amount),
                        format_vtr(a.claimed_amount)
                    );
                }
                println!("Open stake principal: {}", format_vtr(report.total_staked));
            }
        }

        Commands::Schedule {
            category,
            tokens,
            step,
            genesis,
        } => {
            let category: AllocationCategory = category.parse()?;
            schedule(&config, category, tokens, step, parse_time(&genesis)?)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
