use portfolio_core::{FrontierPoint, PortfolioError, Result, ReturnSeries};
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::config::OptimizerConfig;
use crate::performance::PerformanceEvaluator;
use crate::trials::plan_streams;
use crate::weights::sample_weights;

/// Risk/return cloud of `count` random portfolios for frontier charts.
///
/// Uses the same stream layout as the searches, so a seeded call returns the
/// same points in the same order. Zero-volatility portfolios are left out.
pub fn sample_frontier(
    returns: &ReturnSeries,
    count: usize,
    config: &OptimizerConfig,
    cancel: &CancelToken,
) -> Result<Vec<FrontierPoint>> {
    config.validate()?;
    let evaluator =
        PerformanceEvaluator::new(returns, config.risk_free_rate, config.periods_per_year)?;
    let n = evaluator.asset_count();

    let chunks = plan_streams(count, config.streams, config.seed)
        .par_iter()
        .map(|stream| -> Result<Vec<FrontierPoint>> {
            let mut rng = stream.rng();
            let mut points = Vec::with_capacity(stream.len);
            for _ in 0..stream.len {
                if cancel.is_cancelled() {
                    return Err(PortfolioError::Cancelled);
                }
                let weights = sample_weights(&mut rng, n)?;
                match evaluator.evaluate(&weights) {
                    Ok(p) => points.push(FrontierPoint::from(p)),
                    Err(PortfolioError::DegenerateRisk(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(points)
        })
        .collect::<Result<Vec<_>>>()?;

    let points: Vec<FrontierPoint> = chunks.into_iter().flatten().collect();
    tracing::debug!(requested = count, sampled = points.len(), "frontier sampled");
    Ok(points)
}
