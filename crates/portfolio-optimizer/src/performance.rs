use nalgebra::{DMatrix, DVector};
use portfolio_core::{PerformanceResult, PortfolioError, Result, ReturnSeries, WeightVector};
use statrs::statistics::Statistics;

use crate::config::{validate_periods_per_year, validate_risk_free_rate};

/// Annualized mean vector and sample covariance matrix of a return series.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMoments {
    means: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl ReturnMoments {
    pub fn estimate(returns: &ReturnSeries, periods_per_year: f64) -> Result<Self> {
        validate_periods_per_year(periods_per_year)?;

        let n = returns.observations();
        if n < 2 {
            return Err(PortfolioError::InsufficientData(format!(
                "covariance needs at least 2 return observations, got {n}"
            )));
        }

        let values = returns.values();
        let k = values.ncols();
        let means = DVector::from_iterator(k, values.column_iter().map(|col| col.iter().mean()));

        let centered = DMatrix::from_fn(n, k, |i, j| values[(i, j)] - means[j]);
        let covariance = (centered.transpose() * &centered) / (n as f64 - 1.0);

        Ok(Self {
            means: means * periods_per_year,
            covariance: covariance * periods_per_year,
        })
    }

    pub fn means(&self) -> &DVector<f64> {
        &self.means
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn asset_count(&self) -> usize {
        self.means.len()
    }

    /// `(expected_return, volatility)` for already length-checked weights.
    fn portfolio(&self, weights: &[f64]) -> (f64, f64) {
        let w = DVector::from_column_slice(weights);
        let expected_return = w.dot(&self.means);
        let variance = (&self.covariance * &w).dot(&w);
        // Rounding can push a near-zero variance below zero.
        (expected_return, variance.max(0.0).sqrt())
    }
}

/// Evaluates weight vectors against a fixed return series.
///
/// Moments are estimated once at construction, so repeated calls from the
/// search loops only pay for the quadratic form.
#[derive(Debug, Clone)]
pub struct PerformanceEvaluator {
    moments: ReturnMoments,
    risk_free_rate: f64,
}

impl PerformanceEvaluator {
    pub fn new(returns: &ReturnSeries, risk_free_rate: f64, periods_per_year: f64) -> Result<Self> {
        validate_risk_free_rate(risk_free_rate)?;
        let moments = ReturnMoments::estimate(returns, periods_per_year)?;
        Ok(Self {
            moments,
            risk_free_rate,
        })
    }

    pub fn asset_count(&self) -> usize {
        self.moments.asset_count()
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    pub fn moments(&self) -> &ReturnMoments {
        &self.moments
    }

    /// Annualized return, volatility and Sharpe ratio of `weights`.
    ///
    /// A zero-volatility portfolio has no defined Sharpe ratio and is reported
    /// as [`PortfolioError::DegenerateRisk`] rather than a signed infinity.
    pub fn evaluate(&self, weights: &WeightVector) -> Result<PerformanceResult> {
        if weights.len() != self.asset_count() {
            return Err(PortfolioError::InvalidArgument(format!(
                "{} weights for {} assets",
                weights.len(),
                self.asset_count()
            )));
        }

        let (expected_return, volatility) = self.moments.portfolio(weights.as_slice());
        if volatility == 0.0 {
            return Err(PortfolioError::DegenerateRisk(format!(
                "portfolio volatility is zero (expected return {expected_return:.6})"
            )));
        }

        let sharpe_ratio = (expected_return - self.risk_free_rate) / volatility;
        if !sharpe_ratio.is_finite() {
            return Err(PortfolioError::DegenerateRisk(format!(
                "sharpe ratio is not finite (volatility {volatility:e})"
            )));
        }

        Ok(PerformanceResult {
            expected_return,
            volatility,
            sharpe_ratio,
        })
    }
}

/// One-shot evaluation of `weights` over `returns`.
pub fn evaluate(
    weights: &WeightVector,
    returns: &ReturnSeries,
    risk_free_rate: f64,
    periods_per_year: f64,
) -> Result<PerformanceResult> {
    PerformanceEvaluator::new(returns, risk_free_rate, periods_per_year)?.evaluate(weights)
}
