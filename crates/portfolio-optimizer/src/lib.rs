pub mod cancel;
pub mod config;
pub mod engine;
pub mod frontier;
pub mod performance;
pub mod projection;
pub mod returns;
pub mod search;
pub mod weights;

mod trials;

#[cfg(test)]
mod tests;

pub use cancel::CancelToken;
pub use config::OptimizerConfig;
pub use engine::{Objective, PortfolioOptimizer};
pub use frontier::sample_frontier;
pub use performance::{evaluate, PerformanceEvaluator, ReturnMoments};
pub use projection::{project, AssetAllocation, InvestmentProjection};
pub use returns::simple_returns;
pub use search::{max_sharpe, target_risk};
pub use weights::sample_weights;
