use std::collections::{BTreeMap, BTreeSet};

use super::rebalancing_model::{DriftAnalysis, DriftRecord, SignalLevel};
use crate::constants::{HIGH_DRIFT_THRESHOLD, MEDIUM_DRIFT_THRESHOLD, OVERALL_HIGH_DRIFT_THRESHOLD};

/// Interprets a target weight: values above 1 are percentages.
pub fn to_fraction(weight: f64) -> f64 {
    if weight > 1.0 {
        weight / 100.0
    } else {
        weight
    }
}

/// Scales weights so they sum to 1. Non-finite and negative entries count as 0.
/// Returns an empty map when nothing positive remains.
pub fn normalize_weights(weights: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let cleaned: BTreeMap<String, f64> = weights
        .iter()
        .map(|(symbol, w)| {
            let w = if w.is_finite() { w.max(0.0) } else { 0.0 };
            (symbol.clone(), w)
        })
        .collect();
    let total: f64 = cleaned.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }
    cleaned
        .into_iter()
        .map(|(symbol, w)| (symbol, w / total))
        .collect()
}

fn asset_status(drift: f64) -> SignalLevel {
    if drift > HIGH_DRIFT_THRESHOLD {
        SignalLevel::High
    } else if drift > MEDIUM_DRIFT_THRESHOLD {
        SignalLevel::Medium
    } else {
        SignalLevel::Low
    }
}

fn overall_status(max_drift: f64) -> SignalLevel {
    if max_drift > OVERALL_HIGH_DRIFT_THRESHOLD {
        SignalLevel::High
    } else if max_drift > HIGH_DRIFT_THRESHOLD {
        SignalLevel::Medium
    } else {
        SignalLevel::Low
    }
}

/// Compares current weights (fractions) with target weights (fractions or
/// percentages). Symbols missing on either side are treated as 0 there.
pub fn analyze_drift(
    current: &BTreeMap<String, f64>,
    target: &BTreeMap<String, f64>,
) -> DriftAnalysis {
    let symbols: BTreeSet<&String> = current.keys().chain(target.keys()).collect();

    let mut drifts = BTreeMap::new();
    let mut max_drift = 0.0_f64;
    let mut total_drift = 0.0_f64;

    for symbol in symbols {
        let current_weight = current.get(symbol).copied().map(to_fraction).unwrap_or(0.0);
        let target_weight = target.get(symbol).copied().map(to_fraction).unwrap_or(0.0);
        let drift = (current_weight - target_weight).abs();

        max_drift = max_drift.max(drift);
        total_drift += drift;
        drifts.insert(
            symbol.clone(),
            DriftRecord {
                current_pct: current_weight * 100.0,
                target_pct: target_weight * 100.0,
                drift_pct: drift * 100.0,
                status: asset_status(drift),
            },
        );
    }

    DriftAnalysis {
        drifts,
        max_drift_pct: max_drift * 100.0,
        total_drift_pct: total_drift * 100.0,
        needs_rebalance: max_drift > HIGH_DRIFT_THRESHOLD,
        overall_status: overall_status(max_drift),
    }
}
