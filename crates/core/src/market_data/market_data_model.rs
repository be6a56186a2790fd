//! Market data models consumed by the rebalancing engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{is_major, is_stablecoin};
use crate::errors::ValidationError;

/// Risk bucket of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Default classification when the provider has no opinion:
    /// stablecoins are low risk, majors medium, everything else high.
    pub fn for_symbol(symbol: &str) -> Self {
        if is_stablecoin(symbol) {
            RiskCategory::Low
        } else if is_major(symbol) {
            RiskCategory::Medium
        } else {
            RiskCategory::High
        }
    }

    /// Ordinal level used by inverse-risk weighting.
    pub fn level(&self) -> f64 {
        match self {
            RiskCategory::Low => 1.0,
            RiskCategory::Medium => 2.0,
            RiskCategory::High => 3.0,
        }
    }

    /// Score in [0, 1] feeding the drawdown heuristic.
    pub fn risk_score(&self) -> f64 {
        match self {
            RiskCategory::Low => 0.25,
            RiskCategory::Medium => 0.5,
            RiskCategory::High => 0.85,
        }
    }

    /// Neutral volatility assumed when no estimate is available.
    pub fn fallback_volatility(&self) -> f64 {
        match self {
            RiskCategory::Low => 0.01,
            RiskCategory::Medium => 0.5,
            RiskCategory::High => 0.8,
        }
    }

    /// Baseline annual return used when the provider has no forecast.
    pub fn baseline_return(&self) -> f64 {
        match self {
            RiskCategory::Low => 0.03,
            RiskCategory::Medium => 0.10,
            RiskCategory::High => 0.18,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-level market sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    ExtremelyBearish,
    Bearish,
    #[default]
    Neutral,
    Bullish,
    ExtremelyBullish,
}

impl SentimentLabel {
    /// Additive score term used by the tactical strategy.
    pub fn score_term(&self) -> f64 {
        match self {
            SentimentLabel::ExtremelyBearish => -0.25,
            SentimentLabel::Bearish => -0.125,
            SentimentLabel::Neutral => 0.0,
            SentimentLabel::Bullish => 0.125,
            SentimentLabel::ExtremelyBullish => 0.25,
        }
    }

    /// Multiplier applied to risky assets by global risk scaling.
    pub fn risk_multiplier(&self) -> f64 {
        match self {
            SentimentLabel::ExtremelyBearish => 0.6,
            SentimentLabel::Bearish => 0.8,
            SentimentLabel::Neutral => 1.0,
            SentimentLabel::Bullish => 1.2,
            SentimentLabel::ExtremelyBullish => 1.4,
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "extremely_bearish" => Ok(SentimentLabel::ExtremelyBearish),
            "bearish" => Ok(SentimentLabel::Bearish),
            "neutral" => Ok(SentimentLabel::Neutral),
            "bullish" => Ok(SentimentLabel::Bullish),
            "extremely_bullish" => Ok(SentimentLabel::ExtremelyBullish),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown sentiment label '{other}'"
            ))),
        }
    }
}

/// Market-wide context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSentiment {
    /// Fear & greed index, 0 (extreme fear) to 100 (extreme greed).
    pub fear_greed_index: f64,
    /// Annualized market volatility as a fraction.
    pub volatility: f64,
    pub sentiment: SentimentLabel,
}

impl Default for MarketSentiment {
    fn default() -> Self {
        Self {
            fear_greed_index: 50.0,
            volatility: 0.35,
            sentiment: SentimentLabel::Neutral,
        }
    }
}

/// Market regime derived from fear & greed and volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Bull,
    Bear,
    Sideways,
}

impl MarketSentiment {
    pub fn regime(&self) -> MarketRegime {
        if self.fear_greed_index > 70.0 && self.volatility < 0.3 {
            MarketRegime::Bull
        } else if self.fear_greed_index < 30.0 && self.volatility > 0.4 {
            MarketRegime::Bear
        } else {
            MarketRegime::Sideways
        }
    }
}

/// Per-asset signals gathered for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSignals {
    pub symbol: String,
    pub volatility: f64,
    /// Technical score in [-1, 1].
    pub technical_score: f64,
    /// Liquidity score in [0, 1].
    pub liquidity_score: f64,
    pub rsi: f64,
    pub expected_return: f64,
    pub risk_category: RiskCategory,
    /// True when one or more values came from a last-known or neutral fallback.
    #[serde(default)]
    pub stale: bool,
}

impl AssetSignals {
    /// Neutral signals for a symbol with no market data at all.
    pub fn neutral(symbol: &str) -> Self {
        let risk_category = RiskCategory::for_symbol(symbol);
        Self {
            symbol: symbol.to_string(),
            volatility: risk_category.fallback_volatility(),
            technical_score: 0.0,
            liquidity_score: 0.5,
            rsi: 50.0,
            expected_return: risk_category.baseline_return(),
            risk_category,
            stale: true,
        }
    }
}

/// RSI proxy derived from a technical score when no oscillator is available.
pub fn rsi_from_technical_score(technical_score: f64) -> f64 {
    (50.0 + 50.0 * technical_score.clamp(-1.0, 1.0)).clamp(0.0, 100.0)
}

/// A quote update pushed into an in-memory market data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuote {
    pub symbol: String,
    pub price: Decimal,
    pub volatility: f64,
    pub technical_score: f64,
    pub liquidity_score: f64,
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub expected_return: Option<f64>,
    #[serde(default)]
    pub risk_category: Option<RiskCategory>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_risk_category() {
        assert_eq!(RiskCategory::for_symbol("USDC"), RiskCategory::Low);
        assert_eq!(RiskCategory::for_symbol("btc"), RiskCategory::Medium);
        assert_eq!(RiskCategory::for_symbol("DOT"), RiskCategory::High);
    }

    #[test]
    fn test_regime_detection() {
        let bull = MarketSentiment {
            fear_greed_index: 80.0,
            volatility: 0.2,
            sentiment: SentimentLabel::Bullish,
        };
        let bear = MarketSentiment {
            fear_greed_index: 15.0,
            volatility: 0.6,
            sentiment: SentimentLabel::Bearish,
        };
        assert_eq!(bull.regime(), MarketRegime::Bull);
        assert_eq!(bear.regime(), MarketRegime::Bear);
        assert_eq!(MarketSentiment::default().regime(), MarketRegime::Sideways);
    }

    #[test]
    fn test_sentiment_label_parsing() {
        assert_eq!(
            "extremely-bullish".parse::<SentimentLabel>().unwrap(),
            SentimentLabel::ExtremelyBullish
        );
        assert!("sideways".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn test_rsi_proxy_is_bounded() {
        assert_eq!(rsi_from_technical_score(0.0), 50.0);
        assert_eq!(rsi_from_technical_score(-3.0), 0.0);
        assert_eq!(rsi_from_technical_score(1.0), 100.0);
    }
}
