//! Synchronous analysis pipeline over one immutable portfolio snapshot.

use std::collections::BTreeMap;

use log::debug;

use super::concentration::analyze_concentration;
use super::drift::analyze_drift;
use super::engine_config::EngineConfig;
use super::execution_plan::{rebalance_value, ExecutionPlanBuilder};
use super::rebalancing_model::{
    AnalysisRequest, AnalysisResult, ConcentrationRisk, CurrentAllocationEntry,
    ExecutionPlan, OptimizedAllocationEntry, RebalanceSignal, RiskMetrics, TradeAction,
};
use super::risk_metrics::{RiskMetricsCalculator, WeightedAsset};
use super::signal::generate_signal;
use super::strategy::StrategyAllocator;
use crate::constants::HOLD_WEIGHT_BAND;
use crate::market_data::{AssetSignals, MarketSentiment};
use crate::portfolio::holdings::PortfolioSnapshot;

/// Stateless rebalancing engine. Each instance carries its own configuration;
/// two engines never share anything.
#[derive(Debug, Clone)]
pub struct RebalancingEngine {
    config: EngineConfig,
    risk_calculator: RiskMetricsCalculator,
    plan_builder: ExecutionPlanBuilder,
}

impl RebalancingEngine {
    pub fn new(config: EngineConfig) -> Self {
        let risk_calculator = RiskMetricsCalculator::new(
            config.risk_free_rate,
            config.benchmark_return,
            config.confidence_level,
        );
        let plan_builder = ExecutionPlanBuilder::new(config.fee_rate, config.materiality_threshold);
        Self {
            config,
            risk_calculator,
            plan_builder,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs one full analysis pass. Pure and deterministic: identical inputs
    /// always produce an identical result.
    ///
    /// Assets missing from `signals` are analyzed with neutral stale signals.
    pub fn analyze(
        &self,
        snapshot: &PortfolioSnapshot,
        signals: &BTreeMap<String, AssetSignals>,
        market: &MarketSentiment,
        request: &AnalysisRequest,
        data_warnings: Vec<String>,
    ) -> AnalysisResult {
        let current_allocation = current_allocation(snapshot);

        if snapshot.is_degenerate() {
            debug!(
                "Portfolio has no value, returning insufficient-data result for {}",
                request.strategy
            );
            return AnalysisResult {
                strategy: request.strategy.info(),
                risk_tolerance: request.risk_tolerance,
                total_value: snapshot.total_value,
                current_allocation,
                optimized_allocation: Vec::new(),
                drift_analysis: None,
                risk_metrics: RiskMetrics::unavailable(self.config.confidence_level),
                concentration_risk: ConcentrationRisk::unavailable(),
                current_risk_metrics: RiskMetrics::unavailable(self.config.confidence_level),
                current_concentration_risk: ConcentrationRisk::unavailable(),
                rebalance_signal: RebalanceSignal::hold(),
                execution_plan: ExecutionPlan::default(),
                insufficient_data: true,
                data_warnings,
            };
        }

        let asset_signals: Vec<AssetSignals> = snapshot
            .holdings
            .iter()
            .map(|h| {
                signals
                    .get(&h.symbol)
                    .cloned()
                    .unwrap_or_else(|| AssetSignals::neutral(&h.symbol))
            })
            .collect();
        let signal_by_symbol: BTreeMap<&str, &AssetSignals> = asset_signals
            .iter()
            .map(|s| (s.symbol.as_str(), s))
            .collect();

        let allocator = StrategyAllocator::new(request.strategy, request.risk_tolerance);
        let target_weights = allocator.allocate(&asset_signals, market);
        let current_weights = snapshot.weights();

        let drift = analyze_drift(&current_weights, &target_weights);
        let risk_metrics = self
            .risk_calculator
            .calculate(&weighted_assets(&target_weights, &signal_by_symbol));
        let current_risk_metrics = self
            .risk_calculator
            .calculate(&weighted_assets(&current_weights, &signal_by_symbol));
        let concentration_risk = analyze_concentration(target_weights.values().copied());
        let current_concentration_risk = analyze_concentration(current_weights.values().copied());

        let rebalance_signal = generate_signal(
            &drift,
            &risk_metrics,
            &request.overrides,
            self.config.optimal_sharpe,
        );

        let optimized_allocation: Vec<OptimizedAllocationEntry> = target_weights
            .iter()
            .filter_map(|(symbol, target)| {
                let signal = signal_by_symbol.get(symbol.as_str())?;
                let current = current_weights.get(symbol).copied().unwrap_or(0.0);
                let change = target - current;
                Some(OptimizedAllocationEntry {
                    symbol: symbol.clone(),
                    current_weight: current,
                    target_weight: *target,
                    rebalance_amount: change,
                    rebalance_value: rebalance_value(
                        *target,
                        snapshot.value_of(symbol),
                        snapshot.total_value,
                    ),
                    action: entry_action(change),
                    confidence: allocator.confidence(signal, change),
                })
            })
            .collect();

        let execution_plan = self.plan_builder.build(
            &optimized_allocation,
            snapshot.total_value,
            rebalance_signal.expected_improvement,
        );

        debug!(
            "Analyzed {} assets with {}: action={:?}, max drift {:.2}%, {} trades",
            snapshot.holdings.len(),
            request.strategy,
            rebalance_signal.action,
            drift.max_drift_pct,
            execution_plan.trades.len()
        );

        AnalysisResult {
            strategy: request.strategy.info(),
            risk_tolerance: request.risk_tolerance,
            total_value: snapshot.total_value,
            current_allocation,
            optimized_allocation,
            drift_analysis: Some(drift),
            risk_metrics,
            concentration_risk,
            current_risk_metrics,
            current_concentration_risk,
            rebalance_signal,
            execution_plan,
            insufficient_data: false,
            data_warnings,
        }
    }
}

fn entry_action(change: f64) -> TradeAction {
    if change.abs() < HOLD_WEIGHT_BAND {
        TradeAction::Hold
    } else if change > 0.0 {
        TradeAction::Buy
    } else {
        TradeAction::Sell
    }
}

fn current_allocation(snapshot: &PortfolioSnapshot) -> Vec<CurrentAllocationEntry> {
    let weights = snapshot.weights();
    snapshot
        .holdings
        .iter()
        .map(|h| CurrentAllocationEntry {
            symbol: h.symbol.clone(),
            amount: h.amount,
            price: h.current_price,
            value: h.value,
            weight: weights.get(&h.symbol).copied().unwrap_or(0.0),
        })
        .collect()
}

fn weighted_assets(
    weights: &BTreeMap<String, f64>,
    signals: &BTreeMap<&str, &AssetSignals>,
) -> Vec<WeightedAsset> {
    weights
        .iter()
        .filter_map(|(symbol, weight)| {
            signals.get(symbol.as_str()).map(|s| WeightedAsset {
                weight: *weight,
                volatility: s.volatility,
                expected_return: s.expected_return,
                risk_category: s.risk_category,
            })
        })
        .collect()
}
