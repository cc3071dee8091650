//! portfolio-optimizer: random-search allocation over a CSV of closing prices.
//!
//! Maximizes the Sharpe ratio, or finds the best portfolio within tolerance of a
//! target annualized volatility, then projects the investment and prints JSON.
//!
//! Usage:
//!   cargo run -p optimizer-cli -- --prices prices.csv
//!   cargo run -p optimizer-cli -- --prices prices.csv --risk 18 --amount 500000 --years 3
//!   cargo run -p optimizer-cli -- --prices prices.csv --seed 42 --frontier 2000

mod config;
mod prices;
mod report;

use std::time::Duration;

use anyhow::{Context, Result};
use portfolio_optimizer::{project, simple_returns, Objective, PortfolioOptimizer};

use crate::config::CliConfig;
use crate::report::Report;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let mut config = CliConfig::from_env()?;
    config.apply_args(&args)?;

    let path = config
        .prices_csv
        .clone()
        .context("PRICES_CSV not set (or pass --prices <file>)")?;
    let table = prices::load_price_table(&path)?;
    tracing::info!(
        file = %path.display(),
        assets = table.asset_count(),
        rows = table.len(),
        "Loaded price history"
    );

    let returns = simple_returns(&table)?;
    let optimizer = PortfolioOptimizer::new(config.optimizer.clone())?;

    if let Some(secs) = config.search_timeout_secs {
        let cancel = optimizer.cancel_token();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            tracing::warn!(secs, "Search timeout reached, cancelling");
            cancel.cancel();
        });
    }

    let objective = Objective::from_risk_percent(config.target_risk_percent);
    tracing::info!(
        ?objective,
        iterations = config.optimizer.iterations,
        seed = ?config.optimizer.seed,
        "Optimizing"
    );
    let result = optimizer
        .optimize(&returns, objective)
        .context("portfolio search failed")?;
    let projection = project(&result, config.amount, config.years)?;

    let frontier = if config.frontier_points > 0 {
        optimizer
            .frontier(&returns, config.frontier_points)
            .context("frontier sampling failed")?
    } else {
        Vec::new()
    };

    let report = Report {
        result,
        projection,
        frontier,
    };
    report.log_summary();
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
