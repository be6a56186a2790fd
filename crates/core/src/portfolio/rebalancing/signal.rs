use super::rebalancing_model::{
    DriftAnalysis, RebalanceAction, RebalanceOverrides, RebalanceSignal, RiskMetrics,
};
use crate::constants::MAX_EXPECTED_IMPROVEMENT;

/// Decides HOLD vs REBALANCE from drift, honoring caller overrides.
pub fn generate_signal(
    drift: &DriftAnalysis,
    risk: &RiskMetrics,
    overrides: &RebalanceOverrides,
    optimal_sharpe: f64,
) -> RebalanceSignal {
    let action = overrides.action.unwrap_or(if drift.needs_rebalance {
        RebalanceAction::Rebalance
    } else {
        RebalanceAction::Hold
    });
    let urgency = overrides.urgency.unwrap_or(drift.overall_status);

    let expected_improvement = match action {
        RebalanceAction::Hold => 0.0,
        RebalanceAction::Rebalance => {
            expected_improvement(drift.max_drift_pct / 100.0, risk, optimal_sharpe)
        }
    };

    RebalanceSignal {
        action,
        urgency,
        drift_pct: drift.max_drift_pct,
        expected_improvement,
    }
}

fn expected_improvement(max_drift: f64, risk: &RiskMetrics, optimal_sharpe: f64) -> f64 {
    let drift_term = (max_drift / 0.20).min(1.0) * 0.04;
    let var_term = risk
        .value_at_risk
        .map(|var| (var / 0.2).min(1.0) * 0.03)
        .unwrap_or(0.0);
    let sharpe_term = risk
        .sharpe_ratio
        .map(|sharpe| ((sharpe - optimal_sharpe).abs() / 2.0) * 0.02)
        .unwrap_or(0.0);

    let estimate = 0.01 + drift_term + var_term + sharpe_term;
    if estimate.is_finite() {
        estimate.clamp(0.0, MAX_EXPECTED_IMPROVEMENT)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::rebalancing::rebalancing_model::SignalLevel;
    use std::collections::BTreeMap;

    fn drift(max_drift_pct: f64, needs_rebalance: bool, status: SignalLevel) -> DriftAnalysis {
        DriftAnalysis {
            drifts: BTreeMap::new(),
            max_drift_pct,
            total_drift_pct: max_drift_pct * 2.0,
            needs_rebalance,
            overall_status: status,
        }
    }

    fn risk(var: Option<f64>, sharpe: Option<f64>) -> RiskMetrics {
        RiskMetrics {
            value_at_risk: var,
            sharpe_ratio: sharpe,
            ..RiskMetrics::unavailable(0.95)
        }
    }

    #[test]
    fn test_hold_below_threshold() {
        let signal = generate_signal(
            &drift(3.0, false, SignalLevel::Low),
            &risk(Some(0.5), Some(0.2)),
            &RebalanceOverrides::default(),
            1.0,
        );
        assert_eq!(signal.action, RebalanceAction::Hold);
        assert_eq!(signal.expected_improvement, 0.0);
        assert_eq!(signal.urgency, SignalLevel::Low);
    }

    #[test]
    fn test_rebalance_improvement_formula() {
        // drift 0.08 -> 0.4 * 0.04 = 0.016; VaR 0.1 -> 0.5 * 0.03 = 0.015;
        // sharpe 0.5 -> 0.25 * 0.02 = 0.005
        let signal = generate_signal(
            &drift(8.0, true, SignalLevel::Medium),
            &risk(Some(0.1), Some(0.5)),
            &RebalanceOverrides::default(),
            1.0,
        );
        assert_eq!(signal.action, RebalanceAction::Rebalance);
        assert!((signal.expected_improvement - 0.046).abs() < 1e-12);
        assert_eq!(signal.drift_pct, 8.0);
    }

    #[test]
    fn test_improvement_is_capped() {
        let signal = generate_signal(
            &drift(60.0, true, SignalLevel::High),
            &risk(Some(2.0), Some(9.0)),
            &RebalanceOverrides::default(),
            1.0,
        );
        assert_eq!(signal.expected_improvement, MAX_EXPECTED_IMPROVEMENT);
    }

    #[test]
    fn test_missing_metrics_contribute_nothing() {
        let signal = generate_signal(
            &drift(20.0, true, SignalLevel::High),
            &risk(None, None),
            &RebalanceOverrides::default(),
            1.0,
        );
        assert!((signal.expected_improvement - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = RebalanceOverrides {
            action: Some(RebalanceAction::Hold),
            urgency: Some(SignalLevel::Medium),
        };
        let signal = generate_signal(
            &drift(40.0, true, SignalLevel::High),
            &risk(Some(0.3), Some(0.1)),
            &overrides,
            1.0,
        );
        assert_eq!(signal.action, RebalanceAction::Hold);
        assert_eq!(signal.urgency, SignalLevel::Medium);
        assert_eq!(signal.expected_improvement, 0.0);

        let forced = generate_signal(
            &drift(1.0, false, SignalLevel::Low),
            &risk(None, None),
            &RebalanceOverrides {
                action: Some(RebalanceAction::Rebalance),
                urgency: None,
            },
            1.0,
        );
        assert_eq!(forced.action, RebalanceAction::Rebalance);
        assert_eq!(forced.urgency, SignalLevel::Low);
        assert!(forced.expected_improvement > 0.0);
    }
}
