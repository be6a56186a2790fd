//! Portfolio rebalancing and optimization.
//!
//! The engine is a pure pipeline (allocate, measure drift and risk, decide,
//! plan trades). The service wraps it with market-data gathering, fallback
//! handling and a bounded result cache.

mod concentration;
mod drift;
mod engine;
mod engine_config;
mod execution_plan;
mod optimization_cache;
mod rebalancing_model;
mod rebalancing_service;
mod rebalancing_traits;
mod risk_metrics;
mod signal;
mod strategy;

pub use concentration::analyze_concentration;
pub use drift::{analyze_drift, normalize_weights, to_fraction};
pub use engine::RebalancingEngine;
pub use engine_config::EngineConfig;
pub use execution_plan::{rebalance_value, ExecutionPlanBuilder};
pub use optimization_cache::{CacheKey, CacheLookup, CacheStats, OptimizationCache};
pub use rebalancing_model::*;
pub use rebalancing_service::RebalancingService;
pub use rebalancing_traits::*;
pub use risk_metrics::{z_score, RiskMetricsCalculator, WeightedAsset};
pub use signal::generate_signal;
pub use strategy::{clamp_then_normalize, global_risk_scale, StrategyAllocator};

#[cfg(test)]
mod rebalancing_service_tests;
