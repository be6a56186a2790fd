use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::engine::RebalancingEngine;
use super::engine_config::EngineConfig;
use super::optimization_cache::{CacheStats, OptimizationCache};
use super::rebalancing_model::{
    AnalysisRequest, AnalysisResult, AnalysisSummary, RiskTolerance, StrategyInfo, StrategyKind,
};
use super::rebalancing_traits::RebalancingServiceTrait;
use crate::errors::{Result, ValidationError};
use crate::events::DomainEvent;
use crate::market_data::{AssetSignals, MarketAnalyticsTrait, MarketSentiment};
use crate::portfolio::holdings::{
    normalize_holdings, AssetHolding, HoldingInput, PortfolioSnapshot,
};

/// Values last served by the market data collaborator, used when it cannot
/// answer.
#[derive(Default)]
struct LastKnown {
    prices: HashMap<String, Decimal>,
    signals: HashMap<String, AssetSignals>,
    sentiment: Option<MarketSentiment>,
}

/// Everything gathered from the collaborator for one portfolio.
struct MarketContext {
    snapshot: PortfolioSnapshot,
    prices: BTreeMap<String, Decimal>,
    signals: BTreeMap<String, AssetSignals>,
    sentiment: MarketSentiment,
    warnings: Vec<String>,
}

/// Rebalancing facade: gathers market data, runs the engine and owns the
/// optimization cache.
pub struct RebalancingService {
    engine: RebalancingEngine,
    market_data: Arc<dyn MarketAnalyticsTrait>,
    cache: OptimizationCache,
    last_known: Mutex<LastKnown>,
}

impl RebalancingService {
    pub fn new(config: EngineConfig, market_data: Arc<dyn MarketAnalyticsTrait>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: OptimizationCache::new(config.cache_capacity),
            engine: RebalancingEngine::new(config),
            market_data,
            last_known: Mutex::new(LastKnown::default()),
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn last_known(&self) -> MutexGuard<'_, LastKnown> {
        self.last_known.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn gather(&self, holdings: &[HoldingInput]) -> Result<MarketContext> {
        let mut warnings = Vec::new();

        let sentiment = match self.market_data.get_market_sentiment().await {
            Ok(sentiment) => {
                self.last_known().sentiment = Some(sentiment);
                sentiment
            }
            Err(e) => {
                let fallback = self.last_known().sentiment;
                warn!("Market sentiment unavailable, using fallback: {}", e);
                warnings.push(format!("market sentiment unavailable: {}", e));
                fallback.unwrap_or_default()
            }
        };

        let mut assets = Vec::with_capacity(holdings.len());
        let mut prices = BTreeMap::new();
        let mut signals = BTreeMap::new();

        for holding in holdings {
            let symbol = holding.symbol.as_str();
            let price = self.resolve_price(holding, &mut warnings).await;
            let asset_signals = self.resolve_signals(symbol, &mut warnings).await;

            prices.insert(symbol.to_string(), price);
            signals.insert(symbol.to_string(), asset_signals);
            assets.push(AssetHolding::new(symbol, holding.amount, price)?);
        }

        Ok(MarketContext {
            snapshot: PortfolioSnapshot::new(assets, Utc::now())?,
            prices,
            signals,
            sentiment,
            warnings,
        })
    }

    async fn resolve_price(&self, holding: &HoldingInput, warnings: &mut Vec<String>) -> Decimal {
        let symbol = holding.symbol.as_str();
        if let Some(price) = holding.price {
            return price;
        }
        match self.market_data.get_price(symbol).await {
            Ok(price) if price >= Decimal::ZERO => {
                self.last_known().prices.insert(symbol.to_string(), price);
                price
            }
            result => {
                let reason = match result {
                    Ok(price) => format!("negative price {}", price),
                    Err(e) => e.to_string(),
                };
                let fallback = self.last_known().prices.get(symbol).copied();
                match fallback {
                    Some(price) => {
                        warn!(
                            "Price for {} unavailable ({}), using last known {}",
                            symbol, reason, price
                        );
                        warnings.push(format!("{}: using last known price {}", symbol, price));
                        price
                    }
                    None => {
                        warn!(
                            "Price for {} unavailable ({}), valuing at zero",
                            symbol, reason
                        );
                        warnings.push(format!("{}: price unavailable, valued at zero", symbol));
                        Decimal::ZERO
                    }
                }
            }
        }
    }

    async fn resolve_signals(&self, symbol: &str, warnings: &mut Vec<String>) -> AssetSignals {
        match self.fetch_signals(symbol).await {
            Ok(signals) => {
                self.last_known()
                    .signals
                    .insert(symbol.to_string(), signals.clone());
                signals
            }
            Err(e) => {
                let fallback = self.last_known().signals.get(symbol).cloned();
                let mut signals = match fallback {
                    Some(previous) => {
                        warn!("Signals for {} unavailable ({}), using last known", symbol, e);
                        warnings.push(format!("{}: using last known market signals", symbol));
                        previous
                    }
                    None => {
                        warn!(
                            "Signals for {} unavailable ({}), using neutral defaults",
                            symbol, e
                        );
                        warnings.push(format!(
                            "{}: market signals unavailable, using neutral defaults",
                            symbol
                        ));
                        AssetSignals::neutral(symbol)
                    }
                };
                signals.stale = true;
                signals
            }
        }
    }

    async fn fetch_signals(&self, symbol: &str) -> Result<AssetSignals> {
        let market = &self.market_data;
        let volatility = market.get_volatility(symbol).await?;
        let technical_score = market.get_technical_score(symbol).await?;
        let liquidity_score = market.get_liquidity_score(symbol).await?;
        let rsi = market.get_rsi(symbol).await?;
        let risk_category = market.get_risk_category(symbol).await?;
        let expected_return = market.get_expected_return(symbol).await?;

        Ok(AssetSignals {
            symbol: symbol.to_string(),
            volatility: finite_or(volatility, risk_category.fallback_volatility()).max(0.0),
            technical_score: finite_or(technical_score, 0.0).clamp(-1.0, 1.0),
            liquidity_score: finite_or(liquidity_score, 0.5).clamp(0.0, 1.0),
            rsi: finite_or(rsi, 50.0).clamp(0.0, 100.0),
            expected_return: finite_or(expected_return, risk_category.baseline_return()),
            risk_category,
            stale: false,
        })
    }

    fn compute(&self, request: &AnalysisRequest, context: &MarketContext) -> AnalysisResult {
        self.engine.analyze(
            &context.snapshot,
            &context.signals,
            &context.sentiment,
            request,
            context.warnings.clone(),
        )
    }

    /// Cached analysis. Passes that relied on fallback data skip the cache in
    /// both directions.
    fn run(&self, request: &AnalysisRequest, context: &MarketContext) -> AnalysisResult {
        if !context.warnings.is_empty() {
            return self.compute(request, context);
        }
        self.cache
            .get_or_compute(request, &context.prices, || self.compute(request, context))
            .result
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn normalized_request(request: AnalysisRequest) -> Result<AnalysisRequest> {
    Ok(AnalysisRequest {
        holdings: normalize_holdings(&request.holdings)?,
        ..request
    })
}

#[async_trait]
impl RebalancingServiceTrait for RebalancingService {
    async fn analyze_portfolio(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let request = normalized_request(request)?;
        let context = self.gather(&request.holdings).await?;
        Ok(self.run(&request, &context))
    }

    async fn simulate_strategies(
        &self,
        holdings: Vec<HoldingInput>,
        strategies: Vec<StrategyKind>,
        risk_tolerance: RiskTolerance,
    ) -> Result<BTreeMap<StrategyKind, AnalysisSummary>> {
        if strategies.is_empty() {
            return Err(ValidationError::NoStrategies.into());
        }
        let holdings = normalize_holdings(&holdings)?;
        let context = self.gather(&holdings).await?;

        let unique: BTreeSet<StrategyKind> = strategies.into_iter().collect();
        let summaries = unique
            .into_iter()
            .map(|strategy| {
                let request = AnalysisRequest::new(holdings.clone(), strategy)
                    .with_risk_tolerance(risk_tolerance);
                let result = self.run(&request, &context);
                (strategy, AnalysisSummary::from(&result))
            })
            .collect();
        Ok(summaries)
    }

    fn list_strategies(&self) -> Vec<StrategyInfo> {
        StrategyKind::ALL.iter().map(|s| s.info()).collect()
    }

    fn handle_event(&self, event: &DomainEvent) -> usize {
        debug!("Handling domain event {}", event.name());
        match event {
            DomainEvent::PriceUpdated { symbol, price } => {
                let symbol = symbol.to_uppercase();
                self.last_known().prices.insert(symbol.clone(), *price);
                self.cache.invalidate_price(&symbol, *price)
            }
            DomainEvent::HoldingsChanged { symbols } => self.cache.invalidate_symbols(symbols),
            DomainEvent::MarketSentimentChanged => {
                let removed = self.cache.clear();
                if removed > 0 {
                    info!("Cleared {} cached analyses after sentiment change", removed);
                }
                removed
            }
        }
    }

    async fn refresh_cached(&self) -> Result<usize> {
        let requests = self.cache.requests();
        let mut refreshed = 0;

        for request in requests {
            let context = match self.gather(&request.holdings).await {
                Ok(context) => context,
                Err(e) => {
                    warn!("Dropping cached analysis for {}: {}", request.strategy, e);
                    self.cache.remove(&request);
                    continue;
                }
            };
            let result = self.compute(&request, &context);
            if result.data_warnings.is_empty() {
                self.cache.put(&request, context.prices, result);
                refreshed += 1;
            } else {
                debug!(
                    "Keeping cached analysis for {} ({} data warnings)",
                    request.strategy,
                    result.data_warnings.len()
                );
            }
        }

        if refreshed > 0 {
            info!("Refreshed {} cached analyses", refreshed);
        }
        Ok(refreshed)
    }
}
