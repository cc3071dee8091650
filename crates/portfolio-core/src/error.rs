use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Zero-volatility portfolio; the Sharpe ratio is undefined.
    #[error("Degenerate risk: {0}")]
    DegenerateRisk(String),

    #[error("Search cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
