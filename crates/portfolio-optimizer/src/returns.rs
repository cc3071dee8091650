use nalgebra::DMatrix;
use portfolio_core::{PortfolioError, PriceTable, Result, ReturnSeries};

/// Compute simple period-over-period returns from a price table.
///
/// Each output row is `(p[t] - p[t-1]) / p[t-1]` per asset and is dated at
/// `t`. A row is dropped when either of its two source rows has a missing
/// (non-finite) price for any asset, or when one of its returns overflows.
pub fn simple_returns(prices: &PriceTable) -> Result<ReturnSeries> {
    if prices.len() < 2 {
        return Err(PortfolioError::InsufficientData(format!(
            "need at least 2 price rows, got {}",
            prices.len()
        )));
    }

    let counts = prices.observation_counts();
    if let Some(j) = counts.iter().position(|&c| c < 2) {
        return Err(PortfolioError::InsufficientData(format!(
            "{} has {} prices, need at least 2",
            prices.tickers()[j],
            counts[j]
        )));
    }

    let n = prices.asset_count();
    let rows = prices.rows();
    let mut dates = Vec::with_capacity(rows.len() - 1);
    let mut data: Vec<f64> = Vec::with_capacity((rows.len() - 1) * n);
    let mut excluded = 0usize;

    for pair in rows.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let complete = prev
            .closes
            .iter()
            .chain(cur.closes.iter())
            .all(|p| p.is_finite());
        if !complete {
            excluded += 1;
            continue;
        }
        let row: Vec<f64> = prev
            .closes
            .iter()
            .zip(cur.closes.iter())
            .map(|(p0, p1)| (p1 - p0) / p0)
            .collect();
        // Extreme finite prices can still overflow.
        if row.iter().any(|r| !r.is_finite()) {
            excluded += 1;
            continue;
        }
        dates.push(cur.date);
        data.extend(row);
    }

    if excluded > 0 {
        tracing::debug!(excluded, "dropped return rows with missing or non-finite values");
    }
    if dates.is_empty() {
        return Err(PortfolioError::InsufficientData(
            "no two consecutive rows with complete prices".to_string(),
        ));
    }

    let values = DMatrix::from_row_slice(dates.len(), n, &data);
    ReturnSeries::new(prices.tickers().to_vec(), dates, values)
}
