use std::collections::HashSet;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, Result};

/// Weights must sum to 1 within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

fn ensure_unique(tickers: &[String]) -> Result<()> {
    if tickers.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "no assets supplied".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(tickers.len());
    for ticker in tickers {
        if !seen.insert(ticker.as_str()) {
            return Err(PortfolioError::InvalidArgument(format!(
                "duplicate asset identifier: {ticker}"
            )));
        }
    }
    Ok(())
}

/// One dated row of closing prices, aligned to the table's tickers.
/// Missing observations are `f64::NAN` (any non-finite cell counts as missing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub closes: Vec<f64>,
}

impl PriceRow {
    pub fn new(date: NaiveDate, closes: Vec<f64>) -> Self {
        Self { date, closes }
    }
}

/// Closing prices, one row per date and one column per ticker.
#[derive(Debug, Clone)]
pub struct PriceTable {
    tickers: Vec<String>,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Validate and build a price table.
    ///
    /// Rejects duplicate tickers, ragged rows, dates that are not strictly
    /// increasing, and any non-positive price (`-inf` included). Other
    /// non-finite cells are treated as missing, but every ticker needs at
    /// least one observed price.
    pub fn new(tickers: Vec<String>, rows: Vec<PriceRow>) -> Result<Self> {
        ensure_unique(&tickers)?;

        let n = tickers.len();
        let mut observed = vec![0usize; n];

        for (i, row) in rows.iter().enumerate() {
            if row.closes.len() != n {
                return Err(PortfolioError::InvalidArgument(format!(
                    "row {} ({}) has {} prices, expected {}",
                    i,
                    row.date,
                    row.closes.len(),
                    n
                )));
            }
            if i > 0 && row.date <= rows[i - 1].date {
                return Err(PortfolioError::InvalidArgument(format!(
                    "dates must be strictly increasing: {} follows {}",
                    row.date,
                    rows[i - 1].date
                )));
            }
            for (j, &price) in row.closes.iter().enumerate() {
                if price <= 0.0 {
                    return Err(PortfolioError::InvalidArgument(format!(
                        "{} on {}: price must be positive, got {}",
                        tickers[j], row.date, price
                    )));
                }
                if price.is_finite() {
                    observed[j] += 1;
                }
            }
        }

        if let Some(j) = observed.iter().position(|&count| count == 0) {
            return Err(PortfolioError::InsufficientData(format!(
                "no prices for {}",
                tickers[j]
            )));
        }

        Ok(Self { tickers, rows })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn asset_count(&self) -> usize {
        self.tickers.len()
    }

    /// Number of non-missing prices per ticker.
    pub fn observation_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.tickers.len()];
        for row in &self.rows {
            for (j, price) in row.closes.iter().enumerate() {
                if price.is_finite() {
                    counts[j] += 1;
                }
            }
        }
        counts
    }
}

/// Period-over-period relative price changes, observations × assets.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    tickers: Vec<String>,
    /// Date of the later price in each pair. Empty when built without dates.
    dates: Vec<NaiveDate>,
    values: DMatrix<f64>,
}

impl ReturnSeries {
    pub fn new(tickers: Vec<String>, dates: Vec<NaiveDate>, values: DMatrix<f64>) -> Result<Self> {
        ensure_unique(&tickers)?;

        if values.ncols() != tickers.len() {
            return Err(PortfolioError::InvalidArgument(format!(
                "return matrix has {} columns for {} tickers",
                values.ncols(),
                tickers.len()
            )));
        }
        if !dates.is_empty() && dates.len() != values.nrows() {
            return Err(PortfolioError::InvalidArgument(format!(
                "{} dates for {} return observations",
                dates.len(),
                values.nrows()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PortfolioError::InvalidArgument(
                "return series contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            tickers,
            dates,
            values,
        })
    }

    /// Build an undated series from row-major observations.
    pub fn from_rows(tickers: Vec<String>, rows: &[Vec<f64>]) -> Result<Self> {
        let n = tickers.len();
        if let Some(i) = rows.iter().position(|row| row.len() != n) {
            return Err(PortfolioError::InvalidArgument(format!(
                "observation {} has {} values, expected {}",
                i,
                rows[i].len(),
                n
            )));
        }
        let values = DMatrix::from_fn(rows.len(), n, |i, j| rows[i][j]);
        Self::new(tickers, Vec::new(), values)
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn observations(&self) -> usize {
        self.values.nrows()
    }

    pub fn asset_count(&self) -> usize {
        self.values.ncols()
    }
}

/// Long-only portfolio weights summing to 1, positionally aligned to the
/// return series columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    /// Accept caller-supplied weights as-is. No renormalization.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(PortfolioError::InvalidArgument(
                "weight vector is empty".to_string(),
            ));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(PortfolioError::InvalidArgument(format!(
                "weights must be finite and non-negative, got {w}"
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PortfolioError::InvalidArgument(format!(
                "weights must sum to 1, got {sum}"
            )));
        }
        Ok(Self(weights))
    }

    /// Scale non-negative raw values so they sum to 1.
    pub fn normalize(raw: Vec<f64>) -> Result<Self> {
        if let Some(v) = raw.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(PortfolioError::InvalidArgument(format!(
                "raw weights must be finite and non-negative, got {v}"
            )));
        }
        let sum: f64 = raw.iter().sum();
        if sum <= 0.0 {
            return Err(PortfolioError::InvalidArgument(
                "raw weights sum to zero".to_string(),
            ));
        }
        Ok(Self(raw.into_iter().map(|v| v / sum).collect()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Annualized figures for one weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Which search produced an [`OptimizationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    MaxSharpe,
    TargetRisk,
    /// Risk target unreachable; result comes from the max-Sharpe search.
    TargetRiskFallback,
}

/// Outcome of a search, handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub tickers: Vec<String>,
    pub weights: WeightVector,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub message: String,
    pub found: bool,
    pub strategy: SearchStrategy,
    /// Trials evaluated, including skipped ones.
    pub trials: usize,
    /// Trials dropped because the portfolio had degenerate risk.
    pub skipped_trials: usize,
}

impl OptimizationResult {
    pub fn performance(&self) -> PerformanceResult {
        PerformanceResult {
            expected_return: self.expected_return,
            volatility: self.volatility,
            sharpe_ratio: self.sharpe_ratio,
        }
    }

    /// `(ticker, weight)` pairs in column order.
    pub fn allocations(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tickers
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn is_fallback(&self) -> bool {
        self.strategy == SearchStrategy::TargetRiskFallback
    }
}

/// One random portfolio in risk/return space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl From<PerformanceResult> for FrontierPoint {
    fn from(p: PerformanceResult) -> Self {
        Self {
            expected_return: p.expected_return,
            volatility: p.volatility,
            sharpe_ratio: p.sharpe_ratio,
        }
    }
}
