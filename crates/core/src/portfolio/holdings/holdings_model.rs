use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// A holding as supplied by the caller. The price is optional; when absent it
/// is resolved through the market data collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct HoldingInput {
    pub symbol: String,
    pub amount: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl HoldingInput {
    pub fn new(symbol: impl Into<String>, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            price: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }
}

/// A priced holding used for one analysis pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetHolding {
    pub symbol: String,
    pub amount: Decimal,
    pub current_price: Decimal,
    /// amount × current_price
    pub value: Decimal,
}

impl AssetHolding {
    /// Prices a holding. Fails when `amount × current_price` does not fit in a `Decimal`.
    pub fn new(symbol: impl Into<String>, amount: Decimal, current_price: Decimal) -> Result<Self> {
        let symbol = symbol.into();
        let value = amount
            .checked_mul(current_price)
            .ok_or_else(|| ValidationError::ValueOverflow(symbol.clone()))?;
        Ok(Self {
            symbol,
            amount,
            current_price,
            value: value.max(Decimal::ZERO),
        })
    }
}

/// Largest accepted portfolio total. Trade sums can reach twice the total, so
/// a quarter of the `Decimal` range keeps every downstream sum in range.
fn max_total_value() -> Decimal {
    Decimal::MAX / Decimal::from(4)
}

/// Immutable view of the portfolio for a single analysis pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub holdings: Vec<AssetHolding>,
    pub total_value: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl PortfolioSnapshot {
    pub fn new(holdings: Vec<AssetHolding>, timestamp: DateTime<Utc>) -> Result<Self> {
        let total_value = holdings
            .iter()
            .try_fold(Decimal::ZERO, |acc, h| acc.checked_add(h.value))
            .filter(|total| *total <= max_total_value())
            .ok_or_else(|| ValidationError::ValueOverflow("the portfolio".to_string()))?;
        Ok(Self {
            holdings,
            total_value,
            timestamp,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// True when there is nothing to weigh: no holdings or zero total value.
    pub fn is_degenerate(&self) -> bool {
        self.is_empty() || self.total_value <= Decimal::ZERO
    }

    pub fn value_of(&self, symbol: &str) -> Decimal {
        self.holdings
            .iter()
            .find(|h| h.symbol == symbol)
            .map(|h| h.value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Current weights as fractions of total value. Empty when total value is zero.
    pub fn weights(&self) -> BTreeMap<String, f64> {
        if self.total_value <= Decimal::ZERO {
            return BTreeMap::new();
        }
        self.holdings
            .iter()
            .map(|h| {
                let weight = (h.value / self.total_value).to_f64().unwrap_or(0.0);
                (h.symbol.clone(), weight)
            })
            .collect()
    }

    pub fn prices(&self) -> BTreeMap<String, Decimal> {
        self.holdings
            .iter()
            .map(|h| (h.symbol.clone(), h.current_price))
            .collect()
    }
}

/// Portfolio signature: sorted `symbol:amount` pairs.
pub fn portfolio_signature(holdings: &[HoldingInput]) -> String {
    let mut pairs: Vec<String> = holdings
        .iter()
        .map(|h| format!("{}:{}", h.symbol, h.amount.normalize()))
        .collect();
    pairs.sort();
    pairs.join("|")
}

/// Validates caller-supplied holdings and returns them with normalized symbols.
///
/// An empty list is valid (it yields the insufficient-data result); malformed
/// entries are rejected.
pub fn normalize_holdings(holdings: &[HoldingInput]) -> Result<Vec<HoldingInput>> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(holdings.len());

    for holding in holdings {
        let symbol = holding.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol.into());
        }
        if holding.amount < Decimal::ZERO {
            return Err(ValidationError::InvalidAmount {
                symbol,
                amount: holding.amount.to_string(),
            }
            .into());
        }
        if let Some(price) = holding.price {
            if price < Decimal::ZERO {
                return Err(ValidationError::InvalidPrice {
                    symbol,
                    price: price.to_string(),
                }
                .into());
            }
        }
        if !seen.insert(symbol.clone()) {
            return Err(ValidationError::DuplicateSymbol(symbol).into());
        }
        normalized.push(HoldingInput {
            symbol,
            amount: holding.amount,
            price: holding.price,
        });
    }

    Ok(normalized)
}
