use std::cmp::Ordering;

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::rebalancing_model::{
    ExecutionPlan, ExecutionSummary, OptimizedAllocationEntry, Trade, TradeAction, TradePriority,
};
use crate::constants::HIGH_PRIORITY_TRADE_PCT;

/// Converts a weight or rate into a `Decimal`, mapping non-finite input to zero.
fn decimal_from_f64(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO)
}

/// Value that has to move for `symbol` to reach `target_weight` of `total`.
/// Positive means buy.
pub fn rebalance_value(target_weight: f64, current_value: Decimal, total: Decimal) -> Decimal {
    decimal_from_f64(target_weight) * total - current_value
}

/// Turns optimized allocation entries into a fee-aware, prioritized trade list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionPlanBuilder {
    fee_rate: f64,
    materiality: Decimal,
}

impl ExecutionPlanBuilder {
    pub fn new(fee_rate: f64, materiality: Decimal) -> Self {
        Self {
            fee_rate,
            materiality,
        }
    }

    /// Builds the plan. Trades smaller than the materiality threshold are
    /// skipped; the remainder is ordered by value, largest first.
    pub fn build(
        &self,
        entries: &[OptimizedAllocationEntry],
        total_value: Decimal,
        expected_improvement: f64,
    ) -> ExecutionPlan {
        if total_value <= Decimal::ZERO {
            return ExecutionPlan::default();
        }

        let fee_rate = decimal_from_f64(self.fee_rate);
        let mut trades: Vec<Trade> = entries
            .iter()
            .filter_map(|entry| {
                let diff = entry.rebalance_value;
                let amount = diff
                    .abs()
                    .round_dp_with_strategy(2, RoundingStrategy::ToZero);
                if amount.is_zero() || amount < self.materiality {
                    return None;
                }

                let share = (diff.abs() / total_value).to_f64().unwrap_or(0.0);
                Some(Trade {
                    symbol: entry.symbol.clone(),
                    action: if diff > Decimal::ZERO {
                        TradeAction::Buy
                    } else {
                        TradeAction::Sell
                    },
                    amount,
                    pct_of_portfolio: share * 100.0,
                    priority: if share > HIGH_PRIORITY_TRADE_PCT {
                        TradePriority::High
                    } else {
                        TradePriority::Medium
                    },
                    estimated_cost: (diff.abs() * fee_rate).round_dp(2),
                    confidence: entry.confidence,
                })
            })
            .collect();

        trades.sort_by(|a, b| match b.amount.cmp(&a.amount) {
            Ordering::Equal => a.symbol.cmp(&b.symbol),
            other => other,
        });

        let total_traded: Decimal = trades.iter().map(|t| t.amount).sum();
        let total_cost: Decimal = trades.iter().map(|t| t.estimated_cost).sum();
        let cost_pct = (total_cost / total_value).to_f64().map(|c| c * 100.0);

        ExecutionPlan {
            summary: ExecutionSummary {
                total_trades: trades.len(),
                total_value: total_traded,
                total_cost,
                cost_pct,
                expected_improvement_pct: expected_improvement * 100.0,
            },
            trades,
        }
    }
}
