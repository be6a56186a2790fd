//! Core error types for the rebalancing engine.
//!
//! Input problems surface immediately as [`Error::Validation`]. Missing market
//! data is modelled by [`MarketDataError`] so services can absorb it per asset;
//! numeric guards (zero volatility, zero portfolio value) never become errors
//! and are reported as `None` metrics instead.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),
}

/// Validation errors for analysis requests and configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Holding symbol must not be empty")]
    EmptySymbol,

    #[error("Invalid amount {amount} for symbol '{symbol}'")]
    InvalidAmount { symbol: String, amount: String },

    #[error("Invalid price {price} for symbol '{symbol}'")]
    InvalidPrice { symbol: String, price: String },

    #[error("Symbol '{0}' appears more than once in the portfolio")]
    DuplicateSymbol(String),

    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Unknown risk tolerance '{0}'")]
    UnknownRiskTolerance(String),

    #[error("At least one strategy must be provided")]
    NoStrategies,

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Value of {0} exceeds the supported range")]
    ValueOverflow(String),
}

/// Errors raised by market-data collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("No market data available for symbol '{symbol}'")]
    Unavailable { symbol: String },

    #[error("Market sentiment is not available")]
    SentimentUnavailable,
}

impl Error {
    /// True when the error was caused by caller input rather than the engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
