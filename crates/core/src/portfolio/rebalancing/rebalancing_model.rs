//! Rebalancing analysis models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::portfolio::holdings::HoldingInput;

// =============================================================================
// Strategy
// =============================================================================

/// Allocation strategies. Dispatch is an exhaustive `match`, so adding a
/// variant forces every strategy-specific rule to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
    RiskParity,
    Tactical,
    Mpt,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Momentum,
        StrategyKind::MeanReversion,
        StrategyKind::RiskParity,
        StrategyKind::Tactical,
        StrategyKind::Mpt,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::RiskParity => "risk_parity",
            StrategyKind::Tactical => "tactical",
            StrategyKind::Mpt => "mpt",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "Momentum",
            StrategyKind::MeanReversion => "Mean Reversion",
            StrategyKind::RiskParity => "Risk Parity",
            StrategyKind::Tactical => "Tactical Adaptive",
            StrategyKind::Mpt => "Modern Portfolio Theory",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => {
                "Overweights assets with strong technical trends and trims those in decline"
            }
            StrategyKind::MeanReversion => {
                "Buys oversold assets and reduces overbought ones based on RSI extremes"
            }
            StrategyKind::RiskParity => {
                "Weights assets inversely to their risk level and volatility"
            }
            StrategyKind::Tactical => {
                "Blends technicals, liquidity, sentiment and fear & greed into a single tilt"
            }
            StrategyKind::Mpt => {
                "Tilts weights toward assets with the best return per unit of volatility"
            }
        }
    }

    /// Per-asset weight bounds declared by the strategy.
    pub fn bounds(&self) -> WeightBounds {
        match self {
            StrategyKind::Momentum => WeightBounds::new(0.02, 0.45),
            StrategyKind::MeanReversion => WeightBounds::new(0.03, 0.40),
            StrategyKind::RiskParity => WeightBounds::new(0.05, 0.40),
            StrategyKind::Tactical => WeightBounds::new(0.02, 0.50),
            StrategyKind::Mpt => WeightBounds::new(0.02, 0.50),
        }
    }

    pub fn info(&self) -> StrategyInfo {
        let bounds = self.bounds();
        StrategyInfo {
            key: *self,
            name: self.name().to_string(),
            description: self.description().to_string(),
            min_weight: bounds.min,
            max_weight: bounds.max,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "momentum" => Ok(StrategyKind::Momentum),
            "mean_reversion" => Ok(StrategyKind::MeanReversion),
            "risk_parity" => Ok(StrategyKind::RiskParity),
            "tactical" | "adaptive" => Ok(StrategyKind::Tactical),
            "mpt" | "modern_portfolio_theory" => Ok(StrategyKind::Mpt),
            _ => Err(ValidationError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Inclusive per-asset weight bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl WeightBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds actually enforceable for `n` assets. When `n` equal weights do
    /// not fit (`n·max < 1` or `n·min > 1`) the bounds are widened to `1/n`.
    pub fn effective_for(&self, n: usize) -> WeightBounds {
        if n == 0 {
            return *self;
        }
        let equal = 1.0 / n as f64;
        WeightBounds {
            min: self.min.min(equal),
            max: self.max.max(equal),
        }
    }

    pub fn contains(&self, weight: f64, tolerance: f64) -> bool {
        weight >= self.min - tolerance && weight <= self.max + tolerance
    }
}

/// Strategy metadata exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInfo {
    pub key: StrategyKind,
    pub name: String,
    pub description: String,
    pub min_weight: f64,
    pub max_weight: f64,
}

/// Investor risk appetite. Scales the exposure of risky assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn risk_factor(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 0.85,
            RiskTolerance::Moderate => 1.0,
            RiskTolerance::Aggressive => 1.15,
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" | "low" => Ok(RiskTolerance::Conservative),
            "moderate" | "medium" => Ok(RiskTolerance::Moderate),
            "aggressive" | "high" => Ok(RiskTolerance::Aggressive),
            _ => Err(ValidationError::UnknownRiskTolerance(s.to_string())),
        }
    }
}

// =============================================================================
// Drift
// =============================================================================

/// Three-level rating shared by drift status and signal urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Drift of one asset. All values are percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    pub current_pct: f64,
    pub target_pct: f64,
    pub drift_pct: f64,
    pub status: SignalLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftAnalysis {
    pub drifts: BTreeMap<String, DriftRecord>,
    pub max_drift_pct: f64,
    pub total_drift_pct: f64,
    pub needs_rebalance: bool,
    pub overall_status: SignalLevel,
}

// =============================================================================
// Risk & concentration
// =============================================================================

/// Portfolio risk metrics. `None` means insufficient data, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub value_at_risk: Option<f64>,
    pub expected_return: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub calmar_ratio: Option<f64>,
    pub information_ratio: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub volatility: Option<f64>,
    pub confidence_level: f64,
}

impl RiskMetrics {
    pub fn unavailable(confidence_level: f64) -> Self {
        Self {
            value_at_risk: None,
            expected_return: None,
            sharpe_ratio: None,
            sortino_ratio: None,
            calmar_ratio: None,
            information_ratio: None,
            max_drawdown: None,
            volatility: None,
            confidence_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationRisk {
    /// Herfindahl-Hirschman index, Σ w².
    pub hhi: Option<f64>,
    pub gini_approx: Option<f64>,
    pub max_single_asset_weight: Option<f64>,
    /// 1 / HHI.
    pub effective_assets: Option<f64>,
    pub level: Option<ConcentrationLevel>,
}

impl ConcentrationRisk {
    pub fn unavailable() -> Self {
        Self {
            hhi: None,
            gini_approx: None,
            max_single_asset_weight: None,
            effective_assets: None,
            level: None,
        }
    }
}

// =============================================================================
// Signal
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceAction {
    #[default]
    Hold,
    Rebalance,
}

/// Externally supplied recommendation that takes precedence over drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceOverrides {
    #[serde(default)]
    pub action: Option<RebalanceAction>,
    #[serde(default)]
    pub urgency: Option<SignalLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceSignal {
    pub action: RebalanceAction,
    pub urgency: SignalLevel,
    pub drift_pct: f64,
    /// Estimated improvement as a fraction in [0, 0.10].
    pub expected_improvement: f64,
}

impl RebalanceSignal {
    pub fn hold() -> Self {
        Self {
            action: RebalanceAction::Hold,
            urgency: SignalLevel::Low,
            drift_pct: 0.0,
            expected_improvement: 0.0,
        }
    }
}

// =============================================================================
// Allocation & execution
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAllocationEntry {
    pub symbol: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub value: Decimal,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedAllocationEntry {
    pub symbol: String,
    pub current_weight: f64,
    pub target_weight: f64,
    /// target_weight − current_weight
    pub rebalance_amount: f64,
    /// Value that would move at the current total, before the materiality filter.
    pub rebalance_value: Decimal,
    pub action: TradeAction,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradePriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub symbol: String,
    pub action: TradeAction,
    /// Absolute trade value in the portfolio currency.
    pub amount: Decimal,
    pub pct_of_portfolio: f64,
    pub priority: TradePriority,
    pub estimated_cost: Decimal,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total_trades: usize,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub cost_pct: Option<f64>,
    pub expected_improvement_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub trades: Vec<Trade>,
    pub summary: ExecutionSummary,
}

// =============================================================================
// Request & result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub holdings: Vec<HoldingInput>,
    pub strategy: StrategyKind,
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    #[serde(default)]
    pub overrides: RebalanceOverrides,
}

impl AnalysisRequest {
    pub fn new(holdings: Vec<HoldingInput>, strategy: StrategyKind) -> Self {
        Self {
            holdings,
            strategy,
            risk_tolerance: RiskTolerance::default(),
            overrides: RebalanceOverrides::default(),
        }
    }

    pub fn with_risk_tolerance(mut self, risk_tolerance: RiskTolerance) -> Self {
        self.risk_tolerance = risk_tolerance;
        self
    }

    pub fn with_overrides(mut self, overrides: RebalanceOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Full output of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub strategy: StrategyInfo,
    pub risk_tolerance: RiskTolerance,
    pub total_value: Decimal,
    pub current_allocation: Vec<CurrentAllocationEntry>,
    pub optimized_allocation: Vec<OptimizedAllocationEntry>,
    pub drift_analysis: Option<DriftAnalysis>,
    /// Risk of the optimized allocation.
    pub risk_metrics: RiskMetrics,
    /// Concentration of the optimized allocation.
    pub concentration_risk: ConcentrationRisk,
    pub current_risk_metrics: RiskMetrics,
    pub current_concentration_risk: ConcentrationRisk,
    pub rebalance_signal: RebalanceSignal,
    pub execution_plan: ExecutionPlan,
    /// True for the sentinel result returned when the portfolio has no value.
    pub insufficient_data: bool,
    #[serde(default)]
    pub data_warnings: Vec<String>,
}

/// Condensed result used by the strategy comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub strategy: StrategyInfo,
    pub expected_return: Option<f64>,
    pub volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drift_pct: Option<f64>,
    pub hhi: Option<f64>,
    pub action: RebalanceAction,
    pub expected_improvement: f64,
    pub total_trades: usize,
    pub total_cost: Decimal,
}

impl From<&AnalysisResult> for AnalysisSummary {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            strategy: result.strategy.clone(),
            expected_return: result.risk_metrics.expected_return,
            volatility: result.risk_metrics.volatility,
            sharpe_ratio: result.risk_metrics.sharpe_ratio,
            max_drift_pct: result.drift_analysis.as_ref().map(|d| d.max_drift_pct),
            hhi: result.concentration_risk.hhi,
            action: result.rebalance_signal.action,
            expected_improvement: result.rebalance_signal.expected_improvement,
            total_trades: result.execution_plan.summary.total_trades,
            total_cost: result.execution_plan.summary.total_cost,
        }
    }
}
