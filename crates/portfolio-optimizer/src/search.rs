use portfolio_core::{OptimizationResult, PortfolioError, Result, ReturnSeries, SearchStrategy};

use crate::cancel::CancelToken;
use crate::config::OptimizerConfig;
use crate::performance::PerformanceEvaluator;
use crate::trials::{run_trials, Candidate, TrialSummary};

pub const MAX_SHARPE_MESSAGE: &str = "Maximum Sharpe ratio portfolio found.";
pub const TARGET_MET_MESSAGE: &str = "Portfolio optimized successfully for your chosen risk level.";
pub const TARGET_MISSED_MESSAGE: &str = "Your chosen risk level could not be achieved. \
     Showing the best risk-adjusted portfolio (Maximum Sharpe Ratio).";

/// Random search for the portfolio with the highest Sharpe ratio.
///
/// A sampled portfolio becomes the best only when its Sharpe ratio is
/// strictly higher than the current best, so among equal ratios the earliest
/// trial is kept.
pub fn max_sharpe(
    returns: &ReturnSeries,
    config: &OptimizerConfig,
    cancel: &CancelToken,
) -> Result<OptimizationResult> {
    config.validate()?;
    let evaluator =
        PerformanceEvaluator::new(returns, config.risk_free_rate, config.periods_per_year)?;
    max_sharpe_with(&evaluator, returns.tickers(), config, cancel)
}

fn max_sharpe_with(
    evaluator: &PerformanceEvaluator,
    tickers: &[String],
    config: &OptimizerConfig,
    cancel: &CancelToken,
) -> Result<OptimizationResult> {
    let summary = run_trials(evaluator, config, cancel, |p| Some(p.sharpe_ratio))?;
    let best = summary.best.clone().ok_or_else(|| {
        PortfolioError::DegenerateRisk("no trial produced a usable portfolio".to_string())
    })?;

    tracing::info!(
        sharpe = best.performance.sharpe_ratio,
        volatility = best.performance.volatility,
        trial = best.trial,
        "max-Sharpe portfolio selected"
    );

    Ok(build_result(
        tickers,
        best,
        &summary,
        MAX_SHARPE_MESSAGE,
        SearchStrategy::MaxSharpe,
    ))
}

/// Random search for the portfolio whose volatility is closest to
/// `target_risk`, accepting only candidates within `config.tolerance`.
///
/// When no sampled portfolio lands within tolerance the call falls back to
/// [`max_sharpe`] over the same returns and risk-free rate and reports
/// [`SearchStrategy::TargetRiskFallback`].
pub fn target_risk(
    returns: &ReturnSeries,
    target_risk: f64,
    config: &OptimizerConfig,
    cancel: &CancelToken,
) -> Result<OptimizationResult> {
    config.validate()?;
    if !target_risk.is_finite() || target_risk < 0.0 {
        return Err(PortfolioError::InvalidArgument(format!(
            "target risk must be finite and non-negative, got {target_risk}"
        )));
    }
    let evaluator =
        PerformanceEvaluator::new(returns, config.risk_free_rate, config.periods_per_year)?;

    let tolerance = config.tolerance;
    // Score is -|volatility - target|; a closer candidate outside the
    // tolerance band is rejected outright.
    let summary = run_trials(&evaluator, config, cancel, |p| {
        let risk_diff = (p.volatility - target_risk).abs();
        (risk_diff <= tolerance).then_some(-risk_diff)
    })?;

    match summary.best.clone() {
        Some(best) => {
            tracing::info!(
                target_risk,
                volatility = best.performance.volatility,
                sharpe = best.performance.sharpe_ratio,
                trial = best.trial,
                "risk-targeted portfolio selected"
            );
            Ok(build_result(
                returns.tickers(),
                best,
                &summary,
                TARGET_MET_MESSAGE,
                SearchStrategy::TargetRisk,
            ))
        }
        None => {
            tracing::warn!(
                target_risk,
                tolerance,
                "no portfolio within tolerance of target risk, falling back to max Sharpe"
            );
            let mut result = max_sharpe_with(&evaluator, returns.tickers(), config, cancel)?;
            result.strategy = SearchStrategy::TargetRiskFallback;
            result.message = TARGET_MISSED_MESSAGE.to_string();
            result.trials += summary.evaluated;
            result.skipped_trials += summary.skipped;
            Ok(result)
        }
    }
}

fn build_result(
    tickers: &[String],
    best: Candidate,
    summary: &TrialSummary,
    message: &str,
    strategy: SearchStrategy,
) -> OptimizationResult {
    OptimizationResult {
        tickers: tickers.to_vec(),
        weights: best.weights,
        expected_return: best.performance.expected_return,
        volatility: best.performance.volatility,
        sharpe_ratio: best.performance.sharpe_ratio,
        message: message.to_string(),
        found: true,
        strategy,
        trials: summary.evaluated,
        skipped_trials: summary.skipped,
    }
}
