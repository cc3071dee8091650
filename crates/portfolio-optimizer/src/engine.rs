use portfolio_core::{FrontierPoint, OptimizationResult, PriceTable, Result, ReturnSeries};

use crate::cancel::CancelToken;
use crate::config::OptimizerConfig;
use crate::frontier::sample_frontier;
use crate::returns::simple_returns;
use crate::search::{max_sharpe, target_risk};

/// What the optimizer should aim for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    MaxSharpe,
    /// Annualized volatility to hit, e.g. `0.25` for 25%.
    TargetRisk(f64),
}

impl Objective {
    /// A risk level of zero means no target: maximize the Sharpe ratio.
    pub fn from_risk_level(risk: f64) -> Self {
        if risk == 0.0 {
            Self::MaxSharpe
        } else {
            Self::TargetRisk(risk)
        }
    }

    /// Same as [`Objective::from_risk_level`] for a percentage input.
    pub fn from_risk_percent(percent: f64) -> Self {
        Self::from_risk_level(percent / 100.0)
    }
}

/// Entry point tying the return builder, searches and frontier sampling to
/// one validated configuration.
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
    cancel: CancelToken,
}

impl PortfolioOptimizer {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Handle for stopping in-flight searches from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn optimize(&self, returns: &ReturnSeries, objective: Objective) -> Result<OptimizationResult> {
        tracing::debug!(?objective, assets = returns.asset_count(), "optimizing portfolio");
        match objective {
            Objective::MaxSharpe => max_sharpe(returns, &self.config, &self.cancel),
            Objective::TargetRisk(risk) => target_risk(returns, risk, &self.config, &self.cancel),
        }
    }

    pub fn optimize_prices(&self, prices: &PriceTable, objective: Objective) -> Result<OptimizationResult> {
        let returns = simple_returns(prices)?;
        self.optimize(&returns, objective)
    }

    pub fn frontier(&self, returns: &ReturnSeries, count: usize) -> Result<Vec<FrontierPoint>> {
        sample_frontier(returns, count, &self.config, &self.cancel)
    }
}
