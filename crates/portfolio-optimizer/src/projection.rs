use portfolio_core::{OptimizationResult, PortfolioError, Result};
use serde::{Deserialize, Serialize};

/// Capital assigned to one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub ticker: String,
    pub weight: f64,
    pub amount: f64,
}

/// Simple (non-compounded) projection of an optimized portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentProjection {
    pub amount: f64,
    pub years: f64,
    pub expected_return: f64,
    pub expected_profit: f64,
    pub final_value: f64,
    pub allocations: Vec<AssetAllocation>,
}

/// Project `amount` invested for `years` at the portfolio's expected annual
/// return: profit = return × amount × years.
pub fn project(result: &OptimizationResult, amount: f64, years: f64) -> Result<InvestmentProjection> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PortfolioError::InvalidArgument(format!(
            "investment amount must be positive, got {amount}"
        )));
    }
    if !years.is_finite() || years <= 0.0 {
        return Err(PortfolioError::InvalidArgument(format!(
            "investment horizon must be positive, got {years}"
        )));
    }

    let expected_profit = result.expected_return * amount * years;
    let allocations = result
        .allocations()
        .map(|(ticker, weight)| AssetAllocation {
            ticker: ticker.to_string(),
            weight,
            amount: weight * amount,
        })
        .collect();

    Ok(InvestmentProjection {
        amount,
        years,
        expected_return: result.expected_return,
        expected_profit,
        final_value: amount + expected_profit,
        allocations,
    })
}
