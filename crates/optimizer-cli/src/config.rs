use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use portfolio_optimizer::OptimizerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    // Input
    pub prices_csv: Option<PathBuf>,   // date,<TICKER>,... closing prices

    // Investor inputs
    pub target_risk_percent: f64,      // 0 = maximize Sharpe
    pub amount: f64,                   // capital to allocate
    pub years: f64,                    // projection horizon

    // Output
    pub frontier_points: usize,        // 0 = skip the frontier cloud
    pub search_timeout_secs: Option<u64>,

    pub optimizer: OptimizerConfig,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("{key} has an invalid value: {raw}"))
        })
        .transpose()
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = OptimizerConfig::default();

        let optimizer = OptimizerConfig {
            periods_per_year: parse_or(&lookup, "OPTIMIZER_PERIODS_PER_YEAR", defaults.periods_per_year)?,
            risk_free_rate: parse_or(&lookup, "OPTIMIZER_RISK_FREE_RATE", defaults.risk_free_rate)?,
            iterations: parse_or(&lookup, "OPTIMIZER_ITERATIONS", defaults.iterations)?,
            tolerance: parse_or(&lookup, "OPTIMIZER_TOLERANCE", defaults.tolerance)?,
            seed: parse_opt(&lookup, "OPTIMIZER_SEED")?,
            streams: parse_or(&lookup, "OPTIMIZER_STREAMS", defaults.streams)?,
        };

        Ok(Self {
            prices_csv: lookup("PRICES_CSV").map(PathBuf::from),
            target_risk_percent: parse_or(&lookup, "TARGET_RISK_PERCENT", 0.0)?,
            amount: parse_or(&lookup, "INVEST_AMOUNT", 100_000.0)?,
            years: parse_or(&lookup, "INVEST_YEARS", 1.0)?,
            frontier_points: parse_or(&lookup, "FRONTIER_POINTS", 0)?,
            search_timeout_secs: parse_opt(&lookup, "SEARCH_TIMEOUT_SECS")?,
            optimizer,
        })
    }

    /// Command-line flags override the environment.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let flag = |name: &str| {
            args.iter()
                .position(|a| a == name)
                .and_then(|i| args.get(i + 1))
                .map(|v| v.to_string())
        };
        let lookup = |key: &str| match key {
            "PRICES_CSV" => flag("--prices"),
            "TARGET_RISK_PERCENT" => flag("--risk"),
            "INVEST_AMOUNT" => flag("--amount"),
            "INVEST_YEARS" => flag("--years"),
            "FRONTIER_POINTS" => flag("--frontier"),
            "OPTIMIZER_SEED" => flag("--seed"),
            "OPTIMIZER_ITERATIONS" => flag("--iterations"),
            _ => None,
        };

        if let Some(path) = lookup("PRICES_CSV") {
            self.prices_csv = Some(PathBuf::from(path));
        }
        self.target_risk_percent = parse_or(&lookup, "TARGET_RISK_PERCENT", self.target_risk_percent)?;
        self.amount = parse_or(&lookup, "INVEST_AMOUNT", self.amount)?;
        self.years = parse_or(&lookup, "INVEST_YEARS", self.years)?;
        self.frontier_points = parse_or(&lookup, "FRONTIER_POINTS", self.frontier_points)?;
        self.optimizer.iterations = parse_or(&lookup, "OPTIMIZER_ITERATIONS", self.optimizer.iterations)?;
        if let Some(seed) = parse_opt(&lookup, "OPTIMIZER_SEED")? {
            self.optimizer.seed = Some(seed);
        }
        Ok(())
    }
}
