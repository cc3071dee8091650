use portfolio_core::{PortfolioError, Result, WeightVector};
use rand::distributions::{Distribution, Open01};
use rand::Rng;

/// Draw a random long-only weight vector over `n` assets.
///
/// Each raw weight comes from the open interval (0, 1), so the sum is always
/// positive and every normalized weight is strictly positive.
pub fn sample_weights<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Result<WeightVector> {
    if n < 1 {
        return Err(PortfolioError::InvalidArgument(
            "asset count must be at least 1".to_string(),
        ));
    }
    let raw: Vec<f64> = (0..n)
        .map(|_| -> f64 { Open01.sample(&mut *rng) })
        .collect();
    WeightVector::normalize(raw)
}
