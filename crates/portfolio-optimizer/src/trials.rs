//! Parallel trial scheduling shared by the searches and frontier sampling.
//!
//! Trials are numbered `0..iterations` and split into contiguous blocks, one
//! per stream. Every stream owns a `StdRng` derived from the base seed, so the
//! sampled portfolios depend only on `(seed, streams, iterations)` and never
//! on how rayon schedules the streams.

use portfolio_core::{PerformanceResult, PortfolioError, Result, WeightVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::config::OptimizerConfig;
use crate::performance::PerformanceEvaluator;
use crate::weights::sample_weights;

const STREAM_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrialStream {
    /// Global index of the first trial in this stream.
    pub start: usize,
    pub len: usize,
    pub seed: u64,
}

impl TrialStream {
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

pub(crate) fn plan_streams(iterations: usize, streams: usize, seed: Option<u64>) -> Vec<TrialStream> {
    let streams = streams.clamp(1, iterations.max(1));
    let base = seed.unwrap_or_else(rand::random::<u64>);
    let per_stream = iterations / streams;
    let extra = iterations % streams;

    let mut start = 0;
    (0..streams)
        .map(|index| {
            let len = per_stream + usize::from(index < extra);
            let stream = TrialStream {
                start,
                len,
                seed: base ^ (index as u64).wrapping_mul(STREAM_SEED_STRIDE),
            };
            start += len;
            stream
        })
        .collect()
}

/// Best candidate seen so far, tagged with its global trial index.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub trial: usize,
    pub score: f64,
    pub weights: WeightVector,
    pub performance: PerformanceResult,
}

impl Candidate {
    /// Higher score wins; equal scores keep the earlier trial.
    fn beats(&self, other: &Candidate) -> bool {
        self.score > other.score || (self.score == other.score && self.trial < other.trial)
    }
}

#[derive(Debug, Default)]
pub(crate) struct TrialSummary {
    pub best: Option<Candidate>,
    pub evaluated: usize,
    pub skipped: usize,
}

/// Sample and evaluate `config.iterations` random portfolios.
///
/// `score` returns `None` for candidates that may never become best and a
/// higher-is-better score otherwise. Within a stream a candidate replaces the
/// running best only on a strictly higher score, starting from
/// `f64::NEG_INFINITY`.
pub(crate) fn run_trials<F>(
    evaluator: &PerformanceEvaluator,
    config: &OptimizerConfig,
    cancel: &CancelToken,
    score: F,
) -> Result<TrialSummary>
where
    F: Fn(&PerformanceResult) -> Option<f64> + Sync,
{
    let streams = plan_streams(config.iterations, config.streams, config.seed);
    tracing::debug!(
        iterations = config.iterations,
        streams = streams.len(),
        seeded = config.seed.is_some(),
        "running portfolio trials"
    );

    let outcomes = streams
        .par_iter()
        .map(|stream| run_stream(evaluator, stream, cancel, &score))
        .collect::<Result<Vec<_>>>()?;

    let mut summary = TrialSummary::default();
    for outcome in outcomes {
        summary.evaluated += outcome.evaluated;
        summary.skipped += outcome.skipped;
        if let Some(candidate) = outcome.best {
            let replace = match &summary.best {
                None => true,
                Some(best) => candidate.beats(best),
            };
            if replace {
                summary.best = Some(candidate);
            }
        }
    }

    if summary.skipped > 0 {
        if summary.skipped == summary.evaluated {
            return Err(PortfolioError::DegenerateRisk(format!(
                "all {} trials produced zero-volatility portfolios",
                summary.evaluated
            )));
        }
        tracing::warn!(
            skipped = summary.skipped,
            evaluated = summary.evaluated,
            "skipped degenerate trials"
        );
    }

    Ok(summary)
}

fn run_stream<F>(
    evaluator: &PerformanceEvaluator,
    stream: &TrialStream,
    cancel: &CancelToken,
    score: &F,
) -> Result<TrialSummary>
where
    F: Fn(&PerformanceResult) -> Option<f64>,
{
    let n = evaluator.asset_count();
    let mut rng = stream.rng();
    let mut outcome = TrialSummary::default();
    let mut best_score = f64::NEG_INFINITY;

    for offset in 0..stream.len {
        if cancel.is_cancelled() {
            return Err(PortfolioError::Cancelled);
        }

        let weights = sample_weights(&mut rng, n)?;
        outcome.evaluated += 1;

        let performance = match evaluator.evaluate(&weights) {
            Ok(p) => p,
            Err(PortfolioError::DegenerateRisk(_)) => {
                outcome.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(s) = score(&performance) {
            if s > best_score {
                best_score = s;
                outcome.best = Some(Candidate {
                    trial: stream.start + offset,
                    score: s,
                    weights,
                    performance,
                });
            }
        }
    }

    Ok(outcome)
}
