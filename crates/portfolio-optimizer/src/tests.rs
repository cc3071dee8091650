use approx::assert_relative_eq;
use chrono::NaiveDate;
use portfolio_core::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::search::{TARGET_MET_MESSAGE, TARGET_MISSED_MESSAGE};
use crate::*;

/// Helper: two assets, A drifting 0.001/day and B 0.0005/day, with fixed
/// oscillating noise so the covariance is known and nearly diagonal.
fn two_asset_returns(days: usize) -> ReturnSeries {
    let rows: Vec<Vec<f64>> = (0..days)
        .map(|t| {
            let t = t as f64;
            vec![
                0.001 + 0.01 * (0.7 * t).sin(),
                0.0005 + 0.006 * (1.3 * t + 1.0).sin(),
            ]
        })
        .collect();
    ReturnSeries::from_rows(vec!["A".to_string(), "B".to_string()], &rows).unwrap()
}

/// Helper: four assets with different drifts and partly shared noise.
fn four_asset_returns() -> ReturnSeries {
    let rows: Vec<Vec<f64>> = (0..250)
        .map(|t| {
            let t = t as f64;
            let common = 0.004 * (0.21 * t).sin();
            vec![
                0.0008 + common + 0.011 * (0.9 * t).sin(),
                0.0003 + 0.5 * common + 0.006 * (1.7 * t + 0.3).sin(),
                0.0011 + 1.5 * common + 0.016 * (0.4 * t + 1.1).cos(),
                0.0002 + 0.003 * (2.3 * t + 0.5).cos(),
            ]
        })
        .collect();
    let tickers = ["RELIANCE.NS", "TCS.NS", "INFY.NS", "ITC.NS"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ReturnSeries::from_rows(tickers, &rows).unwrap()
}

/// Helper: Sharpe ratio computed with plain loops, independent of the evaluator.
fn reference_sharpe(rows: &[[f64; 2]], w_a: f64, periods: f64) -> f64 {
    let n = rows.len() as f64;
    let mean_a = rows.iter().map(|r| r[0]).sum::<f64>() / n;
    let mean_b = rows.iter().map(|r| r[1]).sum::<f64>() / n;
    let (mut var_a, mut var_b, mut cov_ab) = (0.0, 0.0, 0.0);
    for r in rows {
        let da = r[0] - mean_a;
        let db = r[1] - mean_b;
        var_a += da * da;
        var_b += db * db;
        cov_ab += da * db;
    }
    var_a /= n - 1.0;
    var_b /= n - 1.0;
    cov_ab /= n - 1.0;

    let w_b = 1.0 - w_a;
    let ret = (w_a * mean_a + w_b * mean_b) * periods;
    let var = (w_a * w_a * var_a + w_b * w_b * var_b + 2.0 * w_a * w_b * cov_ab) * periods;
    ret / var.sqrt()
}

#[test]
fn test_max_sharpe_matches_exhaustive_reference() {
    let days = 1000;
    let returns = two_asset_returns(days);
    let rows: Vec<[f64; 2]> = (0..days)
        .map(|i| [returns.values()[(i, 0)], returns.values()[(i, 1)]])
        .collect();

    let reference = (0..=10_000)
        .map(|i| reference_sharpe(&rows, i as f64 / 10_000.0, 252.0))
        .fold(f64::NEG_INFINITY, f64::max);

    let config = OptimizerConfig::default().with_seed(2024);
    assert_eq!(config.iterations, 5000);
    let result = max_sharpe(&returns, &config, &CancelToken::new()).unwrap();

    assert!(result.found);
    assert!(result.sharpe_ratio <= reference + 1e-6);
    assert!(
        reference - result.sharpe_ratio < 1e-3,
        "search {} vs reference {}",
        result.sharpe_ratio,
        reference
    );

    let recomputed = reference_sharpe(&rows, result.weights.as_slice()[0], 252.0);
    assert_relative_eq!(recomputed, result.sharpe_ratio, epsilon = 1e-9);
}

#[test]
fn test_single_stream_matches_sequential_loop() {
    let returns = four_asset_returns();
    let config = OptimizerConfig::default()
        .with_seed(77)
        .with_iterations(1000)
        .with_streams(1);
    let result = max_sharpe(&returns, &config, &CancelToken::new()).unwrap();

    let evaluator = PerformanceEvaluator::new(&returns, 0.0, 252.0).unwrap();
    let mut rng = StdRng::seed_from_u64(77);
    let mut best_sharpe = f64::NEG_INFINITY;
    let mut best_weights = None;
    for _ in 0..1000 {
        let weights = sample_weights(&mut rng, 4).unwrap();
        let perf = evaluator.evaluate(&weights).unwrap();
        if perf.sharpe_ratio > best_sharpe {
            best_sharpe = perf.sharpe_ratio;
            best_weights = Some(weights);
        }
    }

    assert_eq!(Some(result.weights), best_weights);
    assert_eq!(result.sharpe_ratio, best_sharpe);
}

#[test]
fn test_results_do_not_depend_on_thread_count() {
    let returns = four_asset_returns();
    let config = OptimizerConfig::default().with_seed(9).with_iterations(2000);

    let run_with = |threads: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| max_sharpe(&returns, &config, &CancelToken::new()).unwrap())
    };

    let single = run_with(1);
    let many = run_with(4);
    assert_eq!(single, many);

    let target_single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| target_risk(&returns, 0.15, &config, &CancelToken::new()).unwrap());
    let target_many = target_risk(&returns, 0.15, &config, &CancelToken::new()).unwrap();
    assert_eq!(target_single, target_many);
}

#[test]
fn test_same_seed_same_portfolio() {
    let returns = four_asset_returns();
    let config = OptimizerConfig::default().with_seed(123).with_iterations(800);
    let a = max_sharpe(&returns, &config, &CancelToken::new()).unwrap();
    let b = max_sharpe(&returns, &config, &CancelToken::new()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_target_risk_stays_within_tolerance() {
    let returns = four_asset_returns();
    let cancel = CancelToken::new();
    let base = OptimizerConfig::default().with_seed(31).with_iterations(2000);

    let cloud = sample_frontier(&returns, 200, &base, &cancel).unwrap();
    let (lo, hi) = cloud.iter().fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| {
        (lo.min(p.volatility), hi.max(p.volatility))
    });

    for step in 0..=10 {
        let target = lo + (hi - lo) * step as f64 / 10.0;
        for tolerance in [0.001, 0.01, 0.1] {
            let config = base.clone().with_tolerance(tolerance);
            let result = target_risk(&returns, target, &config, &cancel).unwrap();
            assert!(result.found);
            if result.strategy == SearchStrategy::TargetRisk {
                assert!((result.volatility - target).abs() <= tolerance);
                assert_eq!(result.message, TARGET_MET_MESSAGE);
            } else {
                assert_eq!(result.strategy, SearchStrategy::TargetRiskFallback);
            }
        }
    }
}

#[test]
fn test_reachable_target_is_met() {
    let returns = four_asset_returns();
    let equal = WeightVector::new(vec![0.25; 4]).unwrap();
    let target = evaluate(&equal, &returns, 0.0, 252.0).unwrap().volatility;

    let config = OptimizerConfig::default().with_seed(4).with_tolerance(0.02);
    let result = target_risk(&returns, target, &config, &CancelToken::new()).unwrap();
    assert_eq!(result.strategy, SearchStrategy::TargetRisk);
    assert!(!result.is_fallback());
    assert!((result.volatility - target).abs() <= 0.02);
}

#[test]
fn test_unreachable_target_delegates_to_max_sharpe() {
    let returns = four_asset_returns();
    let config = OptimizerConfig::default()
        .with_seed(8)
        .with_iterations(1000)
        .with_tolerance(0.0);
    let cancel = CancelToken::new();

    let result = target_risk(&returns, 10.0, &config, &cancel).unwrap();
    assert!(result.found);
    assert!(result.is_fallback());
    assert_eq!(result.message, TARGET_MISSED_MESSAGE);
    assert_eq!(result.trials, 2000);

    let direct = max_sharpe(&returns, &config, &cancel).unwrap();
    assert_eq!(result.weights, direct.weights);
    assert_eq!(result.sharpe_ratio, direct.sharpe_ratio);
}

#[test]
fn test_all_degenerate_trials_surface_error() {
    let flat = ReturnSeries::from_rows(
        vec!["A".to_string(), "B".to_string()],
        &[vec![0.01, 0.002], vec![0.01, 0.002], vec![0.01, 0.002]],
    )
    .unwrap();
    let config = OptimizerConfig::default().with_seed(1).with_iterations(100);

    let err = max_sharpe(&flat, &config, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, PortfolioError::DegenerateRisk(_)));

    let err = target_risk(&flat, 0.1, &config, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, PortfolioError::DegenerateRisk(_)));
}

#[test]
fn test_scaling_returns_scales_return_and_volatility() {
    let returns = four_asset_returns();
    let mut rng = StdRng::seed_from_u64(55);

    for _ in 0..50 {
        let c: f64 = rng.gen_range(0.1..10.0);
        let scaled = ReturnSeries::new(
            returns.tickers().to_vec(),
            returns.dates().to_vec(),
            returns.values() * c,
        )
        .unwrap();

        let w1 = sample_weights(&mut rng, 4).unwrap();
        let w2 = sample_weights(&mut rng, 4).unwrap();

        let base1 = evaluate(&w1, &returns, 0.0, 252.0).unwrap();
        let base2 = evaluate(&w2, &returns, 0.0, 252.0).unwrap();
        let s1 = evaluate(&w1, &scaled, 0.0, 252.0).unwrap();
        let s2 = evaluate(&w2, &scaled, 0.0, 252.0).unwrap();

        assert_relative_eq!(s1.expected_return, c * base1.expected_return, max_relative = 1e-9);
        assert_relative_eq!(s1.volatility, c * base1.volatility, max_relative = 1e-9);
        assert_relative_eq!(s1.sharpe_ratio, base1.sharpe_ratio, max_relative = 1e-9);
        assert_eq!(s1.sharpe_ratio.signum(), base1.sharpe_ratio.signum());

        if (base1.sharpe_ratio - base2.sharpe_ratio).abs() > 1e-6 {
            assert_eq!(
                base1.sharpe_ratio > base2.sharpe_ratio,
                s1.sharpe_ratio > s2.sharpe_ratio
            );
        }
    }
}

#[test]
fn test_optimize_prices_end_to_end() {
    let returns = four_asset_returns();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut level = vec![100.0, 250.0, 80.0, 40.0];
    let mut rows = vec![PriceRow::new(start, level.clone())];
    for i in 0..returns.observations() {
        for (j, price) in level.iter_mut().enumerate() {
            *price *= 1.0 + returns.values()[(i, j)];
        }
        rows.push(PriceRow::new(start + chrono::Duration::days(i as i64 + 1), level.clone()));
    }
    let prices = PriceTable::new(returns.tickers().to_vec(), rows).unwrap();

    let optimizer =
        PortfolioOptimizer::new(OptimizerConfig::default().with_seed(3).with_iterations(1000))
            .unwrap();
    let result = optimizer.optimize_prices(&prices, Objective::MaxSharpe).unwrap();
    assert!(result.found);
    assert_eq!(result.tickers, returns.tickers());
    assert!((result.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let projection = project(&result, 500_000.0, 2.0).unwrap();
    assert_relative_eq!(
        projection.final_value,
        500_000.0 * (1.0 + 2.0 * result.expected_return),
        max_relative = 1e-12
    );
}

#[test]
fn test_single_row_price_table_is_insufficient() {
    let prices = PriceTable::new(
        vec!["AAPL".to_string()],
        vec![PriceRow::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), vec![185.0])],
    )
    .unwrap();
    let optimizer = PortfolioOptimizer::new(OptimizerConfig::default()).unwrap();
    let err = optimizer.optimize_prices(&prices, Objective::MaxSharpe).unwrap_err();
    assert!(matches!(err, PortfolioError::InsufficientData(_)));
}

#[test]
fn test_cancel_token_from_optimizer() {
    let optimizer = PortfolioOptimizer::new(OptimizerConfig::default().with_seed(1)).unwrap();
    optimizer.cancel_token().cancel();
    let err = optimizer
        .optimize(&four_asset_returns(), Objective::TargetRisk(0.2))
        .unwrap_err();
    assert_eq!(err, PortfolioError::Cancelled);
}

#[test]
fn test_cancel_while_search_is_running() {
    let returns = four_asset_returns();
    let optimizer = PortfolioOptimizer::new(
        OptimizerConfig::default()
            .with_seed(12)
            .with_iterations(500_000_000),
    )
    .unwrap();

    let cancel = optimizer.cancel_token();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.cancel();
    });

    let started = std::time::Instant::now();
    let err = optimizer.optimize(&returns, Objective::MaxSharpe).unwrap_err();
    canceller.join().unwrap();

    assert_eq!(err, PortfolioError::Cancelled);
    assert!(started.elapsed() < std::time::Duration::from_secs(30));
}
