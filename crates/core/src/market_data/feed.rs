//! Write side of the in-memory market data store.
//!
//! Quote and sentiment pushes go through [`MarketDataFeed`], which stores the
//! data and emits the matching domain events in one step.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::in_memory::{validate_quote, InMemoryMarketData};
use super::market_data_model::{AssetQuote, MarketSentiment};
use crate::errors::Result;
use crate::events::DomainEventSink;

/// Outcome of a quote push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedUpdate {
    pub updated: usize,
    pub price_changes: usize,
}

pub struct MarketDataFeed {
    store: Arc<InMemoryMarketData>,
    sink: Arc<dyn DomainEventSink>,
}

impl MarketDataFeed {
    pub fn new(store: Arc<InMemoryMarketData>, sink: Arc<dyn DomainEventSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> Arc<InMemoryMarketData> {
        self.store.clone()
    }

    /// Stores a batch of quotes. The whole batch is rejected if any quote is
    /// invalid; otherwise one `PriceUpdated` is emitted per changed price.
    pub async fn push_quotes(&self, quotes: Vec<AssetQuote>) -> Result<FeedUpdate> {
        for quote in &quotes {
            validate_quote(quote)?;
        }

        let updated = quotes.len();
        let mut events = Vec::new();
        for quote in quotes {
            if let Some(event) = self.store.update_quote(quote).await? {
                events.push(event);
            }
        }

        let price_changes = events.len();
        self.sink.emit_batch(events);
        debug!("Stored {} quotes ({} price changes)", updated, price_changes);

        Ok(FeedUpdate {
            updated,
            price_changes,
        })
    }

    pub async fn push_sentiment(&self, sentiment: MarketSentiment) -> Result<()> {
        let event = self.store.update_sentiment(sentiment).await?;
        self.sink.emit(event);
        Ok(())
    }
}
