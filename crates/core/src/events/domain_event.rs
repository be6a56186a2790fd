//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain events emitted after market or portfolio data changes.
///
/// Events are plain messages. The rebalancing service consumes them to
/// invalidate cached analyses; runtime adapters decide how they are queued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new price was observed for a symbol.
    PriceUpdated { symbol: String, price: Decimal },

    /// Holdings containing these symbols were added, removed or resized.
    HoldingsChanged { symbols: Vec<String> },

    /// Market-wide sentiment (fear & greed, volatility, label) changed.
    MarketSentimentChanged,
}

impl DomainEvent {
    /// Creates a PriceUpdated event.
    pub fn price_updated(symbol: impl Into<String>, price: Decimal) -> Self {
        Self::PriceUpdated {
            symbol: symbol.into(),
            price,
        }
    }

    /// Creates a HoldingsChanged event.
    pub fn holdings_changed(symbols: Vec<String>) -> Self {
        Self::HoldingsChanged { symbols }
    }

    /// Creates a MarketSentimentChanged event.
    pub fn market_sentiment_changed() -> Self {
        Self::MarketSentimentChanged
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PriceUpdated { .. } => "price_updated",
            DomainEvent::HoldingsChanged { .. } => "holdings_changed",
            DomainEvent::MarketSentimentChanged => "market_sentiment_changed",
        }
    }
}
