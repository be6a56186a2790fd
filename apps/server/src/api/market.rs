use std::sync::Arc;

use axum::{extract::State, routing::put, Json, Router};
use cryptofolio_core::market_data::{AssetQuote, FeedUpdate, MarketSentiment};

use crate::{error::ApiResult, main_lib::AppState};

async fn update_quotes(
    State(state): State<Arc<AppState>>,
    Json(quotes): Json<Vec<AssetQuote>>,
) -> ApiResult<Json<FeedUpdate>> {
    let update = state.market_feed.push_quotes(quotes).await?;
    Ok(Json(update))
}

async fn update_sentiment(
    State(state): State<Arc<AppState>>,
    Json(sentiment): Json<MarketSentiment>,
) -> ApiResult<Json<MarketSentiment>> {
    state.market_feed.push_sentiment(sentiment).await?;
    Ok(Json(sentiment))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market/quotes", put(update_quotes))
        .route("/market/sentiment", put(update_sentiment))
}
