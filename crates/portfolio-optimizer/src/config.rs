use portfolio_core::{PortfolioError, Result};
use serde::{Deserialize, Serialize};

/// Daily trading-day sampling.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_ITERATIONS: usize = 5000;
pub const DEFAULT_TOLERANCE: f64 = 0.1;
pub const DEFAULT_STREAMS: usize = 8;

/// Search and evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Return observations per year, used to annualize means and covariance.
    pub periods_per_year: f64,

    /// Annual risk-free rate subtracted in the Sharpe ratio.
    pub risk_free_rate: f64,

    /// Random portfolios sampled per search.
    pub iterations: usize,

    /// Allowed |volatility - target| for the risk-targeted search.
    pub tolerance: f64,

    /// Base seed. `None` seeds every stream from OS entropy.
    pub seed: Option<u64>,

    /// Independent RNG streams the trials are split across.
    /// Results depend on this value, not on the thread count.
    pub streams: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
            iterations: DEFAULT_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            seed: None,
            streams: DEFAULT_STREAMS,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        validate_periods_per_year(self.periods_per_year)?;
        validate_risk_free_rate(self.risk_free_rate)?;
        if self.iterations == 0 {
            return Err(PortfolioError::InvalidArgument(
                "iterations must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PortfolioError::InvalidArgument(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.streams == 0 {
            return Err(PortfolioError::InvalidArgument(
                "streams must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_risk_free_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn with_streams(mut self, streams: usize) -> Self {
        self.streams = streams;
        self
    }

    pub fn with_periods_per_year(mut self, periods_per_year: f64) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }
}

pub(crate) fn validate_periods_per_year(periods_per_year: f64) -> Result<()> {
    if !periods_per_year.is_finite() || periods_per_year <= 0.0 {
        return Err(PortfolioError::InvalidArgument(format!(
            "periods_per_year must be finite and positive, got {periods_per_year}"
        )));
    }
    Ok(())
}

/// Annual rates outside [-100%, 100%] are treated as input mistakes.
pub(crate) fn validate_risk_free_rate(risk_free_rate: f64) -> Result<()> {
    if !risk_free_rate.is_finite() || !(-1.0..=1.0).contains(&risk_free_rate) {
        return Err(PortfolioError::InvalidArgument(format!(
            "risk_free_rate must be within [-1, 1], got {risk_free_rate}"
        )));
    }
    Ok(())
}
