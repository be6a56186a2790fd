use async_trait::async_trait;
use rust_decimal::Decimal;

use super::market_data_model::{rsi_from_technical_score, MarketSentiment, RiskCategory};
use crate::errors::Result;

/// Price feed and market analytics collaborator.
///
/// Implementations return `Error::MarketData(MarketDataError::Unavailable)`
/// when a symbol cannot be served; callers fall back to last-known values.
#[async_trait]
pub trait MarketAnalyticsTrait: Send + Sync {
    async fn get_price(&self, symbol: &str) -> Result<Decimal>;
    async fn get_volatility(&self, symbol: &str) -> Result<f64>;
    /// Technical score in [-1, 1].
    async fn get_technical_score(&self, symbol: &str) -> Result<f64>;
    /// Liquidity score in [0, 1].
    async fn get_liquidity_score(&self, symbol: &str) -> Result<f64>;
    async fn get_market_sentiment(&self) -> Result<MarketSentiment>;

    async fn get_rsi(&self, symbol: &str) -> Result<f64> {
        let technical = self.get_technical_score(symbol).await?;
        Ok(rsi_from_technical_score(technical))
    }

    async fn get_risk_category(&self, symbol: &str) -> Result<RiskCategory> {
        Ok(RiskCategory::for_symbol(symbol))
    }

    /// Annualized return forecast. Defaults to the risk bucket baseline
    /// tilted by the technical score.
    async fn get_expected_return(&self, symbol: &str) -> Result<f64> {
        let category = self.get_risk_category(symbol).await?;
        let technical = self.get_technical_score(symbol).await?;
        Ok(category.baseline_return() + 0.05 * technical.clamp(-1.0, 1.0))
    }
}
