use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BENCHMARK_RETURN, DEFAULT_CACHE_CAPACITY, DEFAULT_CONFIDENCE_LEVEL, DEFAULT_FEE_RATE,
    DEFAULT_MATERIALITY_THRESHOLD, DEFAULT_OPTIMAL_SHARPE, DEFAULT_RISK_FREE_RATE,
};
use crate::errors::{Result, ValidationError};

/// Tunables for one engine instance. Instances never share state, so two
/// engines with different configs can run side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub risk_free_rate: f64,
    pub benchmark_return: f64,
    pub confidence_level: f64,
    pub fee_rate: f64,
    pub materiality_threshold: Decimal,
    pub optimal_sharpe: f64,
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            benchmark_return: DEFAULT_BENCHMARK_RETURN,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            fee_rate: DEFAULT_FEE_RATE,
            materiality_threshold: Decimal::from(DEFAULT_MATERIALITY_THRESHOLD),
            optimal_sharpe: DEFAULT_OPTIMAL_SHARPE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.risk_free_rate,
            self.benchmark_return,
            self.confidence_level,
            self.fee_rate,
            self.optimal_sharpe,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(invalid("all rates must be finite numbers"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(invalid(format!(
                "confidence level {} must be within (0, 1)",
                self.confidence_level
            )));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(invalid(format!(
                "fee rate {} must be within [0, 1)",
                self.fee_rate
            )));
        }
        if self.materiality_threshold < Decimal::ZERO {
            return Err(invalid("materiality threshold must not be negative"));
        }
        if self.cache_capacity == 0 {
            return Err(invalid("cache capacity must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> crate::errors::Error {
    ValidationError::InvalidConfig(message.into()).into()
}
