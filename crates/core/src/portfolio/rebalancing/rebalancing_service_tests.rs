//! Unit tests for the rebalancing service.

use super::*;
use crate::errors::{Error, MarketDataError, Result, ValidationError};
use crate::events::DomainEvent;
use crate::market_data::{MarketAnalyticsTrait, MarketSentiment, RiskCategory, SentimentLabel};
use crate::portfolio::holdings::HoldingInput;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// --- Mock market data ---

#[derive(Clone, Copy)]
struct MockQuote {
    price: Decimal,
    volatility: f64,
    technical_score: f64,
    liquidity_score: f64,
}

#[derive(Default)]
struct MockMarketData {
    quotes: Mutex<HashMap<String, MockQuote>>,
    failing_prices: Mutex<HashSet<String>>,
    failing_signals: Mutex<HashSet<String>>,
    sentiment: Mutex<Option<MarketSentiment>>,
}

impl MockMarketData {
    fn with_quotes(quotes: &[(&str, Decimal, f64, f64)]) -> Arc<Self> {
        let mock = Self::default();
        for (symbol, price, volatility, technical) in quotes {
            mock.set_quote(symbol, *price, *volatility, *technical);
        }
        *mock.sentiment.lock().unwrap() = Some(MarketSentiment::default());
        Arc::new(mock)
    }

    fn set_quote(&self, symbol: &str, price: Decimal, volatility: f64, technical_score: f64) {
        self.quotes.lock().unwrap().insert(
            symbol.to_string(),
            MockQuote {
                price,
                volatility,
                technical_score,
                liquidity_score: 0.8,
            },
        );
    }

    fn fail_price(&self, symbol: &str) {
        self.failing_prices
            .lock()
            .unwrap()
            .insert(symbol.to_string());
    }

    fn fail_signals(&self, symbol: &str) {
        self.failing_signals
            .lock()
            .unwrap()
            .insert(symbol.to_string());
    }

    fn quote(&self, symbol: &str) -> Result<MockQuote> {
        self.quotes
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| unavailable(symbol))
    }

    fn signal_quote(&self, symbol: &str) -> Result<MockQuote> {
        if self.failing_signals.lock().unwrap().contains(symbol) {
            return Err(unavailable(symbol));
        }
        self.quote(symbol)
    }
}

fn unavailable(symbol: &str) -> Error {
    Error::MarketData(MarketDataError::Unavailable {
        symbol: symbol.to_string(),
    })
}

#[async_trait]
impl MarketAnalyticsTrait for MockMarketData {
    async fn get_price(&self, symbol: &str) -> Result<Decimal> {
        if self.failing_prices.lock().unwrap().contains(symbol) {
            return Err(unavailable(symbol));
        }
        Ok(self.quote(symbol)?.price)
    }

    async fn get_volatility(&self, symbol: &str) -> Result<f64> {
        Ok(self.signal_quote(symbol)?.volatility)
    }

    async fn get_technical_score(&self, symbol: &str) -> Result<f64> {
        Ok(self.signal_quote(symbol)?.technical_score)
    }

    async fn get_liquidity_score(&self, symbol: &str) -> Result<f64> {
        Ok(self.signal_quote(symbol)?.liquidity_score)
    }

    async fn get_market_sentiment(&self) -> Result<MarketSentiment> {
        let sentiment = *self.sentiment.lock().unwrap();
        sentiment.ok_or(Error::MarketData(MarketDataError::SentimentUnavailable))
    }
}

// --- Helpers ---

fn service(market: Arc<MockMarketData>) -> RebalancingService {
    RebalancingService::new(EngineConfig::default(), market).unwrap()
}

fn crypto_market() -> Arc<MockMarketData> {
    MockMarketData::with_quotes(&[
        ("BTC", dec!(45000), 0.6, 0.2),
        ("ETH", dec!(3000), 0.7, 0.1),
        ("DOT", dec!(5), 0.9, -0.1),
        ("SOL", dec!(100), 0.9, 0.4),
        ("USDC", dec!(1), 0.01, 0.0),
    ])
}

fn holdings(entries: &[(&str, Decimal)]) -> Vec<HoldingInput> {
    entries
        .iter()
        .map(|(symbol, amount)| HoldingInput::new(*symbol, *amount))
        .collect()
}

fn scenario_a_request() -> AnalysisRequest {
    // BTC $18,000, ETH $1,200, DOT $5
    AnalysisRequest::new(
        holdings(&[("BTC", dec!(0.4)), ("ETH", dec!(0.4)), ("DOT", dec!(1))]),
        StrategyKind::RiskParity,
    )
}

// --- Tests ---

#[tokio::test]
async fn test_risk_parity_underweights_high_risk_asset() {
    let service = service(crypto_market());
    let result = service.analyze_portfolio(scenario_a_request()).await.unwrap();

    assert_eq!(result.total_value, dec!(19205));
    assert_eq!(result.strategy.key, StrategyKind::RiskParity);

    let weight = |symbol: &str| {
        result
            .optimized_allocation
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.target_weight)
            .unwrap()
    };
    assert!(weight("DOT") < weight("BTC"));
    assert!(weight("DOT") < weight("ETH"));

    let sum: f64 = result.optimized_allocation.iter().map(|e| e.target_weight).sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(result.data_warnings.is_empty());
    assert!(result
        .execution_plan
        .trades
        .iter()
        .all(|t| t.amount >= dec!(50)));
}

#[tokio::test]
async fn test_zero_value_portfolio_returns_sentinel() {
    let service = service(crypto_market());
    let request = AnalysisRequest::new(
        holdings(&[("BTC", dec!(0)), ("ETH", dec!(0))]),
        StrategyKind::Momentum,
    );

    let result = service.analyze_portfolio(request).await.unwrap();

    assert!(result.insufficient_data);
    assert_eq!(result.rebalance_signal.action, RebalanceAction::Hold);
    assert!(result.execution_plan.trades.is_empty());
    assert_eq!(result.risk_metrics.volatility, None);
    assert!(result.drift_analysis.is_none());
}

#[tokio::test]
async fn test_empty_portfolio_returns_sentinel() {
    let service = service(crypto_market());
    let result = service
        .analyze_portfolio(AnalysisRequest::new(Vec::new(), StrategyKind::Tactical))
        .await
        .unwrap();
    assert!(result.insufficient_data);
    assert!(result.current_allocation.is_empty());
}

#[tokio::test]
async fn test_identical_inputs_give_identical_results() {
    let market = crypto_market();
    let first_service = service(market.clone());
    let second_service = service(market);

    let first = first_service
        .analyze_portfolio(scenario_a_request())
        .await
        .unwrap();
    let cached = first_service
        .analyze_portfolio(scenario_a_request())
        .await
        .unwrap();
    let recomputed = second_service
        .analyze_portfolio(scenario_a_request())
        .await
        .unwrap();

    assert_eq!(first, cached);
    assert_eq!(first, recomputed);
}

#[tokio::test]
async fn test_invalid_holdings_are_rejected() {
    let service = service(crypto_market());

    let duplicate = AnalysisRequest::new(
        holdings(&[("BTC", dec!(1)), ("btc", dec!(2))]),
        StrategyKind::Mpt,
    );
    let err = service.analyze_portfolio(duplicate).await.unwrap_err();
    assert!(err.is_validation());

    let negative = AnalysisRequest::new(holdings(&[("ETH", dec!(-1))]), StrategyKind::Mpt);
    assert!(matches!(
        service.analyze_portfolio(negative).await,
        Err(Error::Validation(ValidationError::InvalidAmount { .. }))
    ));

    let empty_symbol = AnalysisRequest::new(holdings(&[(" ", dec!(1))]), StrategyKind::Mpt);
    assert!(matches!(
        service.analyze_portfolio(empty_symbol).await,
        Err(Error::Validation(ValidationError::EmptySymbol))
    ));
}

#[tokio::test]
async fn test_results_are_cached_until_price_changes() {
    let market = crypto_market();
    let service = service(market.clone());

    service.analyze_portfolio(scenario_a_request()).await.unwrap();
    service.analyze_portfolio(scenario_a_request()).await.unwrap();
    assert_eq!(service.cache_stats().entries, 1);

    // same price: nothing to invalidate
    assert_eq!(
        service.handle_event(&DomainEvent::price_updated("BTC", dec!(45000))),
        0
    );
    assert_eq!(
        service.handle_event(&DomainEvent::price_updated("btc", dec!(46000))),
        1
    );
    assert_eq!(service.cache_stats().entries, 0);

    market.set_quote("BTC", dec!(46000), 0.6, 0.2);
    let result = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    assert_eq!(result.total_value, dec!(19605));
}

#[tokio::test]
async fn test_price_move_without_event_misses_cache() {
    let market = crypto_market();
    let service = service(market.clone());

    let before = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    market.set_quote("ETH", dec!(3500), 0.7, 0.1);
    let after = service.analyze_portfolio(scenario_a_request()).await.unwrap();

    assert_ne!(before.total_value, after.total_value);
    assert_eq!(after.total_value, dec!(19405));
}

#[tokio::test]
async fn test_holdings_and_sentiment_events_invalidate() {
    let service = service(crypto_market());
    service.analyze_portfolio(scenario_a_request()).await.unwrap();
    service
        .analyze_portfolio(AnalysisRequest::new(
            holdings(&[("SOL", dec!(10)), ("USDC", dec!(1000))]),
            StrategyKind::Tactical,
        ))
        .await
        .unwrap();
    assert_eq!(service.cache_stats().entries, 2);

    assert_eq!(
        service.handle_event(&DomainEvent::holdings_changed(vec!["DOT".to_string()])),
        1
    );
    assert_eq!(
        service.handle_event(&DomainEvent::market_sentiment_changed()),
        1
    );
    assert_eq!(service.cache_stats().entries, 0);
}

#[tokio::test]
async fn test_missing_signals_fall_back_to_neutral_with_penalty() {
    let market = crypto_market();
    market.fail_signals("SOL");
    let service = service(market);

    let request = AnalysisRequest::new(
        holdings(&[("BTC", dec!(0.1)), ("SOL", dec!(20))]),
        StrategyKind::Tactical,
    );
    let result = service.analyze_portfolio(request).await.unwrap();

    assert_eq!(result.data_warnings.len(), 1);
    assert!(result.data_warnings[0].starts_with("SOL"));
    assert!(!result.insufficient_data);
    // fallback results are not cached
    assert_eq!(service.cache_stats().entries, 0);

    let sol = result
        .optimized_allocation
        .iter()
        .find(|e| e.symbol == "SOL")
        .unwrap();
    assert!(sol.confidence >= 0.5 && sol.confidence <= 0.95);
}

#[tokio::test]
async fn test_last_known_price_is_used_when_feed_fails() {
    let market = crypto_market();
    let service = service(market.clone());

    let fresh = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    market.fail_price("BTC");
    let fallback = service.analyze_portfolio(scenario_a_request()).await.unwrap();

    assert_eq!(fresh.total_value, fallback.total_value);
    assert_eq!(fallback.data_warnings.len(), 1);
    assert!(fallback.data_warnings[0].contains("last known price"));
}

#[tokio::test]
async fn test_unknown_price_without_history_values_at_zero() {
    let market = crypto_market();
    market.fail_price("ETH");
    let service = service(market);

    let result = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    let eth = result
        .current_allocation
        .iter()
        .find(|e| e.symbol == "ETH")
        .unwrap();
    assert_eq!(eth.value, Decimal::ZERO);
    assert_eq!(result.total_value, dec!(18005));
    assert!(!result.data_warnings.is_empty());
}

#[tokio::test]
async fn test_caller_supplied_prices_are_used() {
    let service = service(crypto_market());
    let request = AnalysisRequest::new(
        vec![
            HoldingInput::new("BTC", dec!(1)).with_price(dec!(50000)),
            HoldingInput::new("ETH", dec!(10)).with_price(dec!(2500)),
        ],
        StrategyKind::Momentum,
    );
    let result = service.analyze_portfolio(request).await.unwrap();
    assert_eq!(result.total_value, dec!(75000));
}

#[tokio::test]
async fn test_missing_sentiment_uses_default() {
    let market = crypto_market();
    *market.sentiment.lock().unwrap() = None;
    let service = service(market);

    let result = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    assert_eq!(result.data_warnings.len(), 1);
    assert!(result.data_warnings[0].contains("sentiment"));
}

#[tokio::test]
async fn test_simulate_strategies() {
    let service = service(crypto_market());
    let summaries = service
        .simulate_strategies(
            holdings(&[("BTC", dec!(0.4)), ("ETH", dec!(2)), ("SOL", dec!(30))]),
            vec![
                StrategyKind::Momentum,
                StrategyKind::RiskParity,
                StrategyKind::Momentum,
                StrategyKind::Mpt,
            ],
            RiskTolerance::Aggressive,
        )
        .await
        .unwrap();

    assert_eq!(summaries.len(), 3);
    for (strategy, summary) in &summaries {
        assert_eq!(summary.strategy.key, *strategy);
        assert!(summary.expected_improvement >= 0.0 && summary.expected_improvement <= 0.10);
        assert!(summary.hhi.is_some());
    }

    let err = service
        .simulate_strategies(
            holdings(&[("BTC", dec!(1))]),
            Vec::new(),
            RiskTolerance::Moderate,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoStrategies)
    ));
}

#[tokio::test]
async fn test_list_strategies() {
    let service = service(crypto_market());
    let strategies = service.list_strategies();
    assert_eq!(strategies.len(), 5);
    let risk_parity = strategies
        .iter()
        .find(|s| s.key == StrategyKind::RiskParity)
        .unwrap();
    assert_eq!(risk_parity.min_weight, 0.05);
    assert_eq!(risk_parity.max_weight, 0.40);
}

#[tokio::test]
async fn test_refresh_recomputes_cached_entries() {
    let market = crypto_market();
    let service = service(market.clone());

    let before = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    *market.sentiment.lock().unwrap() = Some(MarketSentiment {
        fear_greed_index: 15.0,
        volatility: 0.8,
        sentiment: SentimentLabel::ExtremelyBearish,
    });
    market.set_quote("DOT", dec!(5), 1.4, -0.6);

    assert_eq!(service.refresh_cached().await.unwrap(), 1);
    let after = service.analyze_portfolio(scenario_a_request()).await.unwrap();
    assert_eq!(service.cache_stats().entries, 1);
    assert_ne!(before.risk_metrics, after.risk_metrics);
}

#[tokio::test]
async fn test_oversized_holding_is_a_validation_error() {
    let service = service(crypto_market());
    let request = AnalysisRequest::new(
        vec![HoldingInput::new("BTC", dec!(1e15)).with_price(dec!(1e15))],
        StrategyKind::Momentum,
    );

    let err = service.analyze_portfolio(request).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::ValueOverflow(ref s)) if s == "BTC"
    ));

    let err = service
        .simulate_strategies(
            vec![HoldingInput::new("BTC", dec!(1e15)).with_price(dec!(1e15))],
            vec![StrategyKind::Mpt],
            RiskTolerance::Moderate,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(service.cache_stats().entries, 0);
}

#[tokio::test]
async fn test_refresh_drops_entries_that_no_longer_price() {
    let market = crypto_market();
    let service = service(market.clone());

    service.analyze_portfolio(scenario_a_request()).await.unwrap();
    assert_eq!(service.cache_stats().entries, 1);

    market.set_quote("DOT", Decimal::MAX / Decimal::from(2), 0.9, -0.1);

    assert_eq!(service.refresh_cached().await.unwrap(), 0);
    assert_eq!(service.cache_stats().entries, 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = EngineConfig {
        fee_rate: 2.0,
        ..EngineConfig::default()
    };
    assert!(RebalancingService::new(config, crypto_market()).is_err());
}

#[tokio::test]
async fn test_in_memory_market_data_drives_service() {
    use crate::market_data::{AssetQuote, InMemoryMarketData};
    use chrono::Utc;

    let store = Arc::new(InMemoryMarketData::new());
    for (symbol, price, risk) in [
        ("BTC", dec!(45000), RiskCategory::Medium),
        ("DOT", dec!(5), RiskCategory::High),
    ] {
        store
            .update_quote(AssetQuote {
                symbol: symbol.to_string(),
                price,
                volatility: 0.7,
                technical_score: 0.0,
                liquidity_score: 0.7,
                rsi: None,
                expected_return: None,
                risk_category: Some(risk),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    store
        .update_sentiment(MarketSentiment::default())
        .await
        .unwrap();

    let service = RebalancingService::new(EngineConfig::default(), store.clone()).unwrap();
    let request = AnalysisRequest::new(
        holdings(&[("BTC", dec!(0.1)), ("DOT", dec!(100))]),
        StrategyKind::RiskParity,
    );
    let result = service.analyze_portfolio(request).await.unwrap();
    assert!(result.data_warnings.is_empty());
    assert_eq!(result.total_value, dec!(5000));

    let event = store
        .update_quote(AssetQuote {
            symbol: "DOT".to_string(),
            price: dec!(6),
            volatility: 0.7,
            technical_score: 0.0,
            liquidity_score: 0.7,
            rsi: None,
            expected_return: None,
            risk_category: Some(RiskCategory::High),
            updated_at: Utc::now(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.handle_event(&event), 1);
}
