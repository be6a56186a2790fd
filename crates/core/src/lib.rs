//! Cryptofolio Core - rebalancing engine, domain models, and collaborator traits.
//!
//! This crate contains the portfolio analysis logic. It performs no I/O of its
//! own; market data arrives through [`market_data::MarketAnalyticsTrait`] and
//! runtime adapters deliver [`events::DomainEvent`] messages to the service.

pub mod constants;
pub mod errors;
pub mod events;
pub mod market_data;
pub mod portfolio;

// Re-export common types from the portfolio module
pub use portfolio::holdings::*;
pub use portfolio::rebalancing::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
