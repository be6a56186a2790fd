use std::sync::Arc;

use crate::{
    config::{Config, LogFormat},
    domain_events::WebDomainEventSink,
};
use cryptofolio_core::{
    market_data::{InMemoryMarketData, MarketDataFeed},
    RebalancingService, RebalancingServiceTrait,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub rebalancing_service: Arc<dyn RebalancingServiceTrait>,
    pub market_feed: Arc<MarketDataFeed>,
}

pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let market_data = Arc::new(InMemoryMarketData::new());
    let rebalancing_service: Arc<dyn RebalancingServiceTrait> = Arc::new(
        RebalancingService::new(config.engine.clone(), market_data.clone())?,
    );
    tracing::info!(
        "Rebalancing engine ready (cache capacity {}, fee rate {}, materiality {})",
        config.engine.cache_capacity,
        config.engine.fee_rate,
        config.engine.materiality_threshold
    );

    let domain_event_sink = Arc::new(WebDomainEventSink::new());
    domain_event_sink.start_worker(rebalancing_service.clone());

    let market_feed = Arc::new(MarketDataFeed::new(market_data, domain_event_sink));

    Ok(Arc::new(AppState {
        rebalancing_service,
        market_feed,
    }))
}
