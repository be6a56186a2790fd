//! Strategy allocator: turns per-asset signals and market context into
//! bounded target weights.
//!
//! Pipeline per pass:
//! 1. equal base weight `1/n`
//! 2. strategy multiplier (exhaustive match on [`StrategyKind`])
//! 3. market regime tilt
//! 4. global risk scaling of non-low-risk assets
//! 5. clamp to strategy bounds, then normalize within those bounds

use std::collections::BTreeMap;

use super::rebalancing_model::{RiskTolerance, StrategyKind, WeightBounds};
use crate::constants::{is_major, is_stablecoin, STALE_DATA_CONFIDENCE_PENALTY};
use crate::market_data::{AssetSignals, MarketRegime, MarketSentiment, RiskCategory};

const BISECTION_ITERATIONS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyAllocator {
    strategy: StrategyKind,
    risk_tolerance: RiskTolerance,
}

impl StrategyAllocator {
    pub fn new(strategy: StrategyKind, risk_tolerance: RiskTolerance) -> Self {
        Self {
            strategy,
            risk_tolerance,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Computes target weights keyed by symbol. The result sums to 1 and every
    /// weight lies within the strategy bounds made effective for `n` assets.
    pub fn allocate(
        &self,
        signals: &[AssetSignals],
        market: &MarketSentiment,
    ) -> BTreeMap<String, f64> {
        if signals.is_empty() {
            return BTreeMap::new();
        }

        let raw = self.strategy_weights(signals, market);
        let regime = market.regime();
        let risk_scale = global_risk_scale(market, self.risk_tolerance);

        let mut adjusted: Vec<f64> = signals
            .iter()
            .zip(raw)
            .map(|(signal, weight)| {
                let weight = weight * regime_multiplier(regime, signal.risk_category);
                if signal.risk_category == RiskCategory::Low {
                    weight
                } else {
                    weight * risk_scale
                }
            })
            .map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 })
            .collect();

        if adjusted.iter().all(|w| *w <= 0.0) {
            adjusted = vec![1.0 / signals.len() as f64; signals.len()];
        }

        let bounds = self.strategy.bounds().effective_for(signals.len());
        let normalized = clamp_then_normalize(&adjusted, bounds);

        signals
            .iter()
            .zip(normalized)
            .map(|(signal, weight)| (signal.symbol.clone(), weight))
            .collect()
    }

    fn strategy_weights(&self, signals: &[AssetSignals], market: &MarketSentiment) -> Vec<f64> {
        let base = 1.0 / signals.len() as f64;
        match self.strategy {
            StrategyKind::Momentum => signals
                .iter()
                .map(|s| base * momentum_multiplier(s.technical_score))
                .collect(),
            StrategyKind::MeanReversion => signals
                .iter()
                .map(|s| base * mean_reversion_multiplier(s.rsi, s.technical_score))
                .collect(),
            StrategyKind::RiskParity => {
                let inverse: Vec<f64> = signals
                    .iter()
                    .map(|s| 1.0 / (s.risk_category.level() * (1.0 + s.volatility.max(0.0))))
                    .collect();
                let total: f64 = inverse.iter().sum();
                inverse.into_iter().map(|w| w / total).collect()
            }
            StrategyKind::Tactical => signals
                .iter()
                .map(|s| base * (1.0 + tactical_score(s, market)))
                .collect(),
            StrategyKind::Mpt => signals
                .iter()
                .map(|s| {
                    let return_per_risk = if s.volatility > 0.0 {
                        s.expected_return / s.volatility
                    } else {
                        0.0
                    };
                    base * (1.0 + (return_per_risk - 0.5))
                })
                .collect(),
        }
    }

    /// Confidence in the recommendation for one asset, in [0.5, 0.95].
    pub fn confidence(&self, signal: &AssetSignals, weight_change: f64) -> f64 {
        let mut confidence = 0.7;

        confidence += if is_stablecoin(&signal.symbol) {
            0.10
        } else if is_major(&signal.symbol) {
            0.05
        } else {
            -0.05
        };

        confidence += match self.strategy {
            StrategyKind::Momentum if signal.technical_score.abs() > 0.3 => 0.05,
            StrategyKind::Momentum => 0.0,
            StrategyKind::MeanReversion if signal.rsi < 30.0 || signal.rsi > 70.0 => 0.05,
            StrategyKind::MeanReversion => 0.0,
            StrategyKind::RiskParity => 0.03,
            StrategyKind::Tactical => 0.02,
            StrategyKind::Mpt => 0.0,
        };

        confidence += (2.0 * weight_change.abs()).min(0.2);

        if signal.stale {
            confidence -= STALE_DATA_CONFIDENCE_PENALTY;
        }

        confidence.clamp(0.5, 0.95)
    }
}

fn momentum_multiplier(technical_score: f64) -> f64 {
    if technical_score > 0.3 {
        1.8
    } else if technical_score > 0.1 {
        1.3
    } else if technical_score < -0.3 {
        0.4
    } else if technical_score < -0.1 {
        0.7
    } else {
        1.0
    }
}

fn mean_reversion_multiplier(rsi: f64, technical_score: f64) -> f64 {
    if rsi < 30.0 && technical_score < -0.2 {
        1.6
    } else if rsi < 40.0 {
        1.2
    } else if rsi > 70.0 && technical_score > 0.2 {
        0.5
    } else if rsi > 60.0 {
        0.8
    } else {
        1.0
    }
}

fn tactical_score(signal: &AssetSignals, market: &MarketSentiment) -> f64 {
    0.4 * signal.technical_score
        + 0.2 * (signal.liquidity_score - 0.5)
        + market.sentiment.score_term()
        + 0.15 * ((market.fear_greed_index - 50.0) / 100.0)
}

fn regime_multiplier(regime: MarketRegime, risk: RiskCategory) -> f64 {
    match (regime, risk) {
        (MarketRegime::Bear, RiskCategory::Low) => 1.2,
        (MarketRegime::Bull, RiskCategory::High) => 1.1,
        _ => 1.0,
    }
}

/// Exposure multiplier for risky assets, clamped to [0.4, 1.6].
pub fn global_risk_scale(market: &MarketSentiment, risk_tolerance: RiskTolerance) -> f64 {
    let mut scale = market.sentiment.risk_multiplier();
    if market.fear_greed_index < 20.0 {
        scale *= 0.8;
    }
    if market.fear_greed_index > 80.0 {
        scale *= 0.9;
    }
    if market.volatility > 0.4 {
        scale *= 0.85;
    }
    scale *= risk_tolerance.risk_factor();
    scale.clamp(0.4, 1.6)
}

/// Clamps every weight into `bounds`, then rescales so the weights sum to 1
/// while keeping each one inside `bounds`.
///
/// The rescale finds `λ` with `Σ clamp(λ·wᵢ, min, max) = 1` by bisection; the
/// sum is monotone in `λ`, so the answer is unique where it matters and the
/// pass is deterministic. `bounds` must admit `n` equal weights (see
/// [`WeightBounds::effective_for`]) and `min` must be positive.
pub fn clamp_then_normalize(weights: &[f64], bounds: WeightBounds) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let clamp = |w: f64| w.clamp(bounds.min, bounds.max);
    let clamped: Vec<f64> = weights.iter().map(|w| clamp(*w)).collect();
    let sum_at = |lambda: f64| clamped.iter().map(|w| clamp(lambda * w)).sum::<f64>();

    let mut low = 0.0_f64;
    let mut high = 1.0_f64;
    let mut guard = 0;
    while sum_at(high) < 1.0 && guard < 64 {
        high *= 2.0;
        guard += 1;
    }

    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (low + high);
        if sum_at(mid) < 1.0 {
            low = mid;
        } else {
            high = mid;
        }
        if high - low <= f64::EPSILON * high {
            break;
        }
    }

    let mut result: Vec<f64> = clamped.iter().map(|w| clamp(high * w)).collect();

    // Spread the last rounding residue over positions that are off their bounds.
    let residue = 1.0 - result.iter().sum::<f64>();
    if residue != 0.0 {
        if let Some(idx) = result
            .iter()
            .position(|w| *w + residue >= bounds.min && *w + residue <= bounds.max)
        {
            result[idx] += residue;
        }
    }
    result
}
