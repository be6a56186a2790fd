//! In-memory market data store.
//!
//! Holds the latest quote per symbol and the current market sentiment. Writers
//! receive the domain events that must be emitted so cached analyses can be
//! invalidated.

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::market_data_model::{rsi_from_technical_score, AssetQuote, MarketSentiment, RiskCategory};
use super::market_data_traits::MarketAnalyticsTrait;
use crate::errors::{Error, MarketDataError, Result, ValidationError};
use crate::events::DomainEvent;

#[derive(Default)]
pub struct InMemoryMarketData {
    quotes: RwLock<HashMap<String, AssetQuote>>,
    sentiment: RwLock<Option<MarketSentiment>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a quote. Returns `PriceUpdated` when the price is new or changed.
    pub async fn update_quote(&self, mut quote: AssetQuote) -> Result<Option<DomainEvent>> {
        validate_quote(&quote)?;
        quote.symbol = quote.symbol.trim().to_uppercase();
        quote.technical_score = quote.technical_score.clamp(-1.0, 1.0);
        quote.liquidity_score = quote.liquidity_score.clamp(0.0, 1.0);

        let mut quotes = self.quotes.write().await;
        let previous = quotes.insert(quote.symbol.clone(), quote.clone());
        let changed = previous.map_or(true, |p| p.price != quote.price);
        debug!(
            "Stored quote for {} at {} (price changed: {})",
            quote.symbol, quote.price, changed
        );
        Ok(changed.then(|| DomainEvent::price_updated(quote.symbol, quote.price)))
    }

    /// Replaces the market sentiment.
    pub async fn update_sentiment(&self, sentiment: MarketSentiment) -> Result<DomainEvent> {
        if !(0.0..=100.0).contains(&sentiment.fear_greed_index) {
            return Err(ValidationError::InvalidInput(format!(
                "fear & greed index {} outside 0-100",
                sentiment.fear_greed_index
            ))
            .into());
        }
        if !sentiment.volatility.is_finite() || sentiment.volatility < 0.0 {
            return Err(ValidationError::InvalidInput(format!(
                "invalid market volatility {}",
                sentiment.volatility
            ))
            .into());
        }
        *self.sentiment.write().await = Some(sentiment);
        Ok(DomainEvent::market_sentiment_changed())
    }

    pub async fn quote(&self, symbol: &str) -> Option<AssetQuote> {
        self.quotes.read().await.get(&symbol.to_uppercase()).cloned()
    }

    pub async fn len(&self) -> usize {
        self.quotes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.quotes.read().await.is_empty()
    }

    async fn require_quote(&self, symbol: &str) -> Result<AssetQuote> {
        self.quote(symbol).await.ok_or_else(|| {
            Error::MarketData(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
            })
        })
    }
}

pub(super) fn validate_quote(quote: &AssetQuote) -> Result<()> {
    if quote.symbol.trim().is_empty() {
        return Err(ValidationError::EmptySymbol.into());
    }
    if quote.price < Decimal::ZERO {
        return Err(ValidationError::InvalidPrice {
            symbol: quote.symbol.clone(),
            price: quote.price.to_string(),
        }
        .into());
    }
    let finite = [quote.volatility, quote.technical_score, quote.liquidity_score]
        .iter()
        .all(|v| v.is_finite());
    if !finite || quote.volatility < 0.0 {
        return Err(ValidationError::InvalidInput(format!(
            "non-finite or negative signal in quote for '{}'",
            quote.symbol
        ))
        .into());
    }
    Ok(())
}

#[async_trait]
impl MarketAnalyticsTrait for InMemoryMarketData {
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        Ok(self.require_quote(symbol).await?.price)
    }

    async fn get_volatility(&self, symbol: &str) -> Result<f64> {
        Ok(self.require_quote(symbol).await?.volatility)
    }

    async fn get_technical_score(&self, symbol: &str) -> Result<f64> {
        Ok(self.require_quote(symbol).await?.technical_score)
    }

    async fn get_liquidity_score(&self, symbol: &str) -> Result<f64> {
        Ok(self.require_quote(symbol).await?.liquidity_score)
    }

    async fn get_market_sentiment(&self) -> Result<MarketSentiment> {
        let sentiment = *self.sentiment.read().await;
        sentiment.ok_or(Error::MarketData(MarketDataError::SentimentUnavailable))
    }

    async fn get_rsi(&self, symbol: &str) -> Result<f64> {
        let quote = self.require_quote(symbol).await?;
        Ok(quote
            .rsi
            .unwrap_or_else(|| rsi_from_technical_score(quote.technical_score)))
    }

    async fn get_risk_category(&self, symbol: &str) -> Result<RiskCategory> {
        let quote = self.require_quote(symbol).await?;
        Ok(quote
            .risk_category
            .unwrap_or_else(|| RiskCategory::for_symbol(symbol)))
    }

    async fn get_expected_return(&self, symbol: &str) -> Result<f64> {
        let quote = self.require_quote(symbol).await?;
        let category = quote
            .risk_category
            .unwrap_or_else(|| RiskCategory::for_symbol(symbol));
        Ok(quote
            .expected_return
            .unwrap_or_else(|| category.baseline_return() + 0.05 * quote.technical_score))
    }
}
