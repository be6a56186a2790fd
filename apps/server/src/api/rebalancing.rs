use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use cryptofolio_core::{
    errors::Error as CoreError, AnalysisRequest, AnalysisResult, AnalysisSummary, HoldingInput,
    RebalanceOverrides, RiskTolerance, StrategyInfo, StrategyKind,
};
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody {
    holdings: Vec<HoldingInput>,
    strategy: String,
    #[serde(default)]
    risk_tolerance: Option<String>,
    #[serde(default)]
    overrides: RebalanceOverrides,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateBody {
    holdings: Vec<HoldingInput>,
    strategies: Vec<String>,
    #[serde(default)]
    risk_tolerance: Option<String>,
}

fn parse_risk_tolerance(value: Option<&str>) -> Result<RiskTolerance, CoreError> {
    match value {
        Some(v) => Ok(v.parse::<RiskTolerance>()?),
        None => Ok(RiskTolerance::default()),
    }
}

async fn analyze_portfolio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeBody>,
) -> ApiResult<Json<AnalysisResult>> {
    let strategy = body
        .strategy
        .parse::<StrategyKind>()
        .map_err(CoreError::from)?;
    let risk_tolerance = parse_risk_tolerance(body.risk_tolerance.as_deref())?;
    let request = AnalysisRequest::new(body.holdings, strategy)
        .with_risk_tolerance(risk_tolerance)
        .with_overrides(body.overrides);

    let result = state.rebalancing_service.analyze_portfolio(request).await?;
    Ok(Json(result))
}

async fn simulate_strategies(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimulateBody>,
) -> ApiResult<Json<BTreeMap<StrategyKind, AnalysisSummary>>> {
    let strategies = body
        .strategies
        .iter()
        .map(|s| s.parse::<StrategyKind>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(CoreError::from)?;
    let risk_tolerance = parse_risk_tolerance(body.risk_tolerance.as_deref())?;

    let summaries = state
        .rebalancing_service
        .simulate_strategies(body.holdings, strategies, risk_tolerance)
        .await?;
    Ok(Json(summaries))
}

async fn list_strategies(State(state): State<Arc<AppState>>) -> Json<Vec<StrategyInfo>> {
    Json(state.rebalancing_service.list_strategies())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rebalance/analyze", post(analyze_portfolio))
        .route("/rebalance/simulate", post(simulate_strategies))
        .route("/rebalance/strategies", get(list_strategies))
}
