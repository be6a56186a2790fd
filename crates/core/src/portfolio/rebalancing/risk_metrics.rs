//! Risk metrics for a weighted allocation.
//!
//! Volatility is the weight-averaged asset volatility rather than a full
//! covariance-weighted portfolio variance; without a return-history feed
//! there is no covariance matrix to use. Max drawdown is likewise a heuristic
//! derived from the assets' risk buckets. Both are deterministic.

use statrs::distribution::{ContinuousCDF, Normal};

use super::rebalancing_model::RiskMetrics;
use crate::market_data::RiskCategory;

/// Sortino proxy: downside volatility assumed to be 70% of total volatility.
const DOWNSIDE_VOLATILITY_SHARE: f64 = 0.7;

/// One asset's contribution to the portfolio risk profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedAsset {
    pub weight: f64,
    pub volatility: f64,
    pub expected_return: f64,
    pub risk_category: RiskCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetricsCalculator {
    risk_free_rate: f64,
    benchmark_return: f64,
    confidence_level: f64,
}

impl RiskMetricsCalculator {
    pub fn new(risk_free_rate: f64, benchmark_return: f64, confidence_level: f64) -> Self {
        Self {
            risk_free_rate,
            benchmark_return,
            confidence_level,
        }
    }

    pub fn calculate(&self, assets: &[WeightedAsset]) -> RiskMetrics {
        let total_weight: f64 = assets.iter().map(|a| a.weight).sum();
        if assets.is_empty() || total_weight <= 0.0 || !total_weight.is_finite() {
            return RiskMetrics::unavailable(self.confidence_level);
        }

        let expected_return: f64 = assets.iter().map(|a| a.weight * a.expected_return).sum();
        let volatility: f64 = assets
            .iter()
            .map(|a| a.weight * a.volatility.max(0.0))
            .sum();
        let weighted_risk_score: f64 = assets
            .iter()
            .map(|a| a.weight * a.risk_category.risk_score())
            .sum();
        let max_drawdown = -0.5 * weighted_risk_score;

        if volatility <= 0.0 || !volatility.is_finite() {
            return RiskMetrics {
                value_at_risk: None,
                expected_return: Some(expected_return),
                sharpe_ratio: None,
                sortino_ratio: None,
                calmar_ratio: None,
                information_ratio: None,
                max_drawdown: Some(max_drawdown),
                volatility: Some(0.0),
                confidence_level: self.confidence_level,
            };
        }

        let excess = expected_return - self.risk_free_rate;
        let calmar_ratio = if max_drawdown != 0.0 {
            Some(expected_return / max_drawdown.abs())
        } else {
            None
        };

        RiskMetrics {
            value_at_risk: Some(volatility * z_score(self.confidence_level)),
            expected_return: Some(expected_return),
            sharpe_ratio: Some(excess / volatility),
            sortino_ratio: Some(excess / (DOWNSIDE_VOLATILITY_SHARE * volatility)),
            calmar_ratio,
            information_ratio: Some((expected_return - self.benchmark_return) / volatility),
            max_drawdown: Some(max_drawdown),
            volatility: Some(volatility),
            confidence_level: self.confidence_level,
        }
    }
}

/// One-sided z-score for a confidence level. Common levels use the familiar
/// rounded table values; anything else goes through the inverse normal CDF.
pub fn z_score(confidence_level: f64) -> f64 {
    const TABLE: [(f64, f64); 3] = [(0.90, 1.282), (0.95, 1.645), (0.99, 2.326)];

    if let Some((_, z)) = TABLE
        .iter()
        .find(|(level, _)| (level - confidence_level).abs() < 1e-9)
    {
        return *z;
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return 1.645;
    }
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(confidence_level))
        .unwrap_or(1.645)
}
