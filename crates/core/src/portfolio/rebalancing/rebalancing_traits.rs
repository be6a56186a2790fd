use std::collections::BTreeMap;

use async_trait::async_trait;

use super::rebalancing_model::{
    AnalysisRequest, AnalysisResult, AnalysisSummary, RiskTolerance, StrategyInfo, StrategyKind,
};
use crate::errors::Result;
use crate::events::DomainEvent;
use crate::portfolio::holdings::HoldingInput;

/// Trait for rebalancing service operations
#[async_trait]
pub trait RebalancingServiceTrait: Send + Sync {
    /// Full analysis of one portfolio under one strategy.
    async fn analyze_portfolio(&self, request: AnalysisRequest) -> Result<AnalysisResult>;

    /// Runs the same portfolio through several strategies for comparison.
    async fn simulate_strategies(
        &self,
        holdings: Vec<HoldingInput>,
        strategies: Vec<StrategyKind>,
        risk_tolerance: RiskTolerance,
    ) -> Result<BTreeMap<StrategyKind, AnalysisSummary>>;

    fn list_strategies(&self) -> Vec<StrategyInfo>;

    /// Applies a domain event to the cache. Returns the number of evicted entries.
    fn handle_event(&self, event: &DomainEvent) -> usize;

    /// Recomputes every cached analysis against fresh market data.
    async fn refresh_cached(&self) -> Result<usize>;
}
