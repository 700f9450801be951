//! Tithe inflation simulator.
//!
//! Builds a genesis ledger, funds a population of voters split across a few
//! inflation destinations, then closes one ledger per week: a ledger of
//! ordinary payments (which feed the fee pool) followed by a ledger carrying
//! the inflation request. Prints a JSON report of every round.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tithe_core::constants::{INFLATION_START_TIME, NetworkType};
use tithe_core::genesis::{GENESIS_CLOSE_TIME, root_account_id};
use tithe_core::types::AccountId;
use tithe_inflation::InflationParams;
use tithe_ledger::{LedgerConfig, LedgerManager, LogFormat, Transaction};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NetworkArg {
    Mainnet,
    Testnet,
    Standalone,
}

impl From<NetworkArg> for NetworkType {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Mainnet => NetworkType::Mainnet,
            NetworkArg::Testnet => NetworkType::Testnet,
            NetworkArg::Standalone => NetworkType::Standalone,
        }
    }
}

/// Tithe inflation simulator.
#[derive(Parser, Debug)]
#[command(
    name = "tithe-sim",
    version,
    about = "Replay weekly inflation rounds on a fresh Tithe ledger"
)]
struct Args {
    /// TOML configuration file (TITHE_* environment variables override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Network whose parameters to use
    #[arg(long, value_enum)]
    network: Option<NetworkArg>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long)]
    log_format: Option<String>,

    /// Number of weekly rounds to run
    #[arg(long, default_value_t = 4)]
    weeks: u32,

    /// Number of voting accounts
    #[arg(long, default_value_t = 10)]
    voters: u32,

    /// Number of inflation destinations the voters split across
    #[arg(long, default_value_t = 3)]
    destinations: u32,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    /// Layer CLI flags over the loaded configuration.
    fn into_config(&self) -> Result<LedgerConfig> {
        let mut config =
            LedgerConfig::load(self.config.as_deref()).context("Failed to load configuration")?;
        if let Some(network) = self.network {
            config.network = network.into();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.parse().context("Invalid --log-format")?;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct Payout {
    account: String,
    amount: u64,
}

#[derive(Debug, Serialize)]
struct RoundReport {
    week: u32,
    ledger_seq: u64,
    close_time: u64,
    close_date: String,
    applied: bool,
    inflation_seq: u64,
    total_coins: u64,
    fee_pool: u64,
    fees_collected: u64,
    issued: u64,
    payouts: Vec<Payout>,
    header_hash: String,
}

#[derive(Debug, Serialize)]
struct SimReport {
    network: NetworkType,
    params: InflationParams,
    voters: u32,
    destinations: u32,
    rounds: Vec<RoundReport>,
}

fn named(kind: &str, i: u32) -> AccountId {
    AccountId::from_seed(format!("{kind}-{i}").as_bytes())
}

fn close_date(close_time: u64) -> String {
    i64::try_from(close_time)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

struct Simulation {
    manager: LedgerManager,
    root: AccountId,
    params: InflationParams,
    voters: u32,
    destinations: u32,
}

impl Simulation {
    fn destination_ids(&self) -> impl Iterator<Item = AccountId> {
        (0..self.destinations).map(|d| named("destination", d))
    }

    /// Fund destinations and voters, and register every vote.
    fn populate(&self) -> Result<()> {
        let reserve = self.manager.header().min_balance(0);
        let root_balance = self.manager.account(&self.root)?.balance;
        let stake = root_balance / (2 * u64::from(self.voters.max(1)));

        let mut txs: Vec<Transaction> = self
            .destination_ids()
            .map(|dest| Transaction::create_account(self.root, dest, reserve))
            .collect();
        for v in 0..self.voters {
            // Uneven stakes so the ranking is not a tie.
            let balance = (stake / u64::from(v + 1)).max(reserve);
            txs.push(Transaction::create_account(self.root, named("voter", v), balance));
        }
        for v in 0..self.voters {
            let dest = named("destination", v % self.destinations.max(1));
            txs.push(Transaction::set_inflation_destination(named("voter", v), Some(dest)));
        }

        let result = self
            .manager
            .close_ledger(GENESIS_CLOSE_TIME, &txs)
            .context("Failed to close setup ledger")?;
        if result.failed_count() > 0 {
            bail!("{} setup transactions failed", result.failed_count());
        }
        info!(
            voters = self.voters,
            destinations = self.destinations,
            ledger = result.ledger_seq,
            "population funded"
        );
        Ok(())
    }

    fn run_week(&self, week: u32) -> Result<RoundReport> {
        let close_time = INFLATION_START_TIME + u64::from(week) * self.params.epoch_length;

        // Ordinary traffic: every voter pays root a little.
        let traffic: Vec<Transaction> = (0..self.voters)
            .map(|v| Transaction::payment(named("voter", v), self.root, 1_000 + u64::from(v)))
            .collect();
        let traffic_result = self
            .manager
            .close_ledger(close_time, &traffic)
            .with_context(|| format!("Failed to close traffic ledger for week {week}"))?;

        let before = self.manager.header();
        let balances: BTreeMap<AccountId, u64> = self
            .destination_ids()
            .filter_map(|id| self.manager.account(&id).ok().map(|a| (id, a.balance)))
            .collect();

        let result = self
            .manager
            .close_ledger(close_time, &[Transaction::inflation(self.root)])
            .with_context(|| format!("Failed to close inflation ledger for week {week}"))?;
        let after = self.manager.header();

        let applied = result.inflation.len() == 1;
        if let Some(e) = result.results.first().and_then(|r| r.error()) {
            warn!(week, error = %e, "inflation not applied");
        }

        let payouts = result
            .inflation
            .iter()
            .flat_map(|delta| delta.accounts.values())
            .map(|post| Payout {
                account: post.id.to_string(),
                amount: post.balance - balances.get(&post.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(RoundReport {
            week,
            ledger_seq: result.ledger_seq,
            close_time,
            close_date: close_date(close_time),
            applied,
            inflation_seq: after.inflation_seq,
            total_coins: after.total_coins,
            fee_pool: after.fee_pool,
            fees_collected: traffic_result.fees_charged() + result.fees_charged(),
            issued: after.total_coins - before.total_coins,
            payouts,
            header_hash: result.header_hash.to_string(),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.into_config()?;

    init_logging(&config.log_level, config.log_format);

    info!("Tithe simulator v{}", env!("CARGO_PKG_VERSION"));
    info!(network = %config.network, weeks = args.weeks, voters = args.voters, "starting");

    let params = config.inflation_params();
    let sim = Simulation {
        manager: LedgerManager::genesis(config.network, params.clone())
            .context("Failed to build genesis ledger")?,
        root: root_account_id(config.network),
        params,
        voters: args.voters,
        destinations: args.destinations,
    };

    sim.populate()?;
    let mut rounds = Vec::with_capacity(args.weeks as usize);
    for week in 0..args.weeks {
        rounds.push(sim.run_week(week)?);
    }
    sim.manager
        .check_conservation()
        .context("Conservation check failed after simulation")?;

    let report = SimReport {
        network: config.network,
        params: sim.params,
        voters: sim.voters,
        destinations: sim.destinations,
        rounds,
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn init_logging(level_str: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // Logs go to stderr so the report on stdout stays parseable.
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init(),
    }
}
