use portfolio_core::{FrontierPoint, OptimizationResult};
use portfolio_optimizer::InvestmentProjection;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    pub result: OptimizationResult,
    pub projection: InvestmentProjection,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frontier: Vec<FrontierPoint>,
}

impl Report {
    pub fn log_summary(&self) {
        tracing::info!(
            strategy = ?self.result.strategy,
            found = self.result.found,
            expected_return = format!("{:.2}%", self.result.expected_return * 100.0),
            volatility = format!("{:.2}%", self.result.volatility * 100.0),
            sharpe = format!("{:.3}", self.result.sharpe_ratio),
            trials = self.result.trials,
            skipped = self.result.skipped_trials,
            "{}",
            self.result.message
        );
        for allocation in &self.projection.allocations {
            tracing::info!(
                ticker = %allocation.ticker,
                weight = format!("{:.2}%", allocation.weight * 100.0),
                amount = format!("{:.2}", allocation.amount),
                "allocation"
            );
        }
        tracing::info!(
            amount = self.projection.amount,
            years = self.projection.years,
            expected_profit = format!("{:.2}", self.projection.expected_profit),
            final_value = format!("{:.2}", self.projection.final_value),
            "projection"
        );
    }
}
