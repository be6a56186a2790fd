use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cryptofolio_server::{api::app_router, build_state, config::Config};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn build_test_router() -> Router {
    let config = Config::default();
    let state = build_state(&config).await.unwrap();
    app_router(state, &config)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

fn priced_holdings() -> Value {
    json!([
        { "symbol": "BTC", "amount": 0.1, "price": 60000 },
        { "symbol": "ETH", "amount": 1, "price": 3000 },
        { "symbol": "SOL", "amount": 10, "price": 100 }
    ])
}

#[tokio::test]
async fn healthz_responds_ok() {
    let app = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn lists_all_strategies() {
    let app = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/rebalance/strategies", None).await;
    assert_eq!(status, StatusCode::OK);

    let strategies = body.as_array().unwrap();
    assert_eq!(strategies.len(), 5);
    let keys: Vec<&str> = strategies
        .iter()
        .map(|s| s["key"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"risk_parity"));
    assert!(keys.contains(&"mean_reversion"));
}

#[tokio::test]
async fn analyze_with_caller_prices() {
    let app = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/analyze",
        Some(json!({
            "holdings": priced_holdings(),
            "strategy": "risk_parity",
            "riskTolerance": "moderate"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["totalValue"].as_f64(), Some(10000.0));
    assert_eq!(body["strategy"]["key"], "risk_parity");
    assert_eq!(body["optimizedAllocation"].as_array().unwrap().len(), 3);

    let weight_sum: f64 = body["optimizedAllocation"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["targetWeight"].as_f64().unwrap())
        .sum();
    assert!((weight_sum - 1.0).abs() < 1e-9);

    // No quotes or sentiment have been pushed yet.
    assert!(!body["dataWarnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analyze_uses_pushed_quotes_and_sentiment() {
    let app = build_test_router().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/market/quotes",
        Some(json!([
            { "symbol": "btc", "price": 50000, "volatility": 0.6, "technicalScore": 0.3, "liquidityScore": 0.95 },
            { "symbol": "ETH", "price": 2500, "volatility": 0.75, "technicalScore": -0.1, "liquidityScore": 0.9 }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updated"], 2);
    assert_eq!(body["priceChanges"], 2);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/market/sentiment",
        Some(json!({ "fearGreedIndex": 55, "volatility": 0.35, "sentiment": "neutral" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/analyze",
        Some(json!({
            "holdings": [
                { "symbol": "BTC", "amount": 0.1 },
                { "symbol": "ETH", "amount": 2 }
            ],
            "strategy": "momentum"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["totalValue"].as_f64(), Some(10000.0));
    assert_eq!(body["dataWarnings"], json!([]));
    assert_eq!(body["insufficientData"], false);
}

#[tokio::test]
async fn invalid_input_is_bad_request() {
    let app = build_test_router().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/analyze",
        Some(json!({
            "holdings": [{ "symbol": "BTC", "amount": -1, "price": 60000 }],
            "strategy": "momentum"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/analyze",
        Some(json!({ "holdings": priced_holdings(), "strategy": "astrology" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("astrology"));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/market/sentiment",
        Some(json!({ "fearGreedIndex": 140, "volatility": 0.35, "sentiment": "bullish" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_portfolio_returns_insufficient_data() {
    let app = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/analyze",
        Some(json!({ "holdings": [], "strategy": "mpt" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["insufficientData"], true);
    assert_eq!(body["rebalanceSignal"]["action"], "HOLD");
    assert_eq!(body["executionPlan"]["trades"], json!([]));
}

#[tokio::test]
async fn simulate_compares_strategies() {
    let app = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/simulate",
        Some(json!({
            "holdings": priced_holdings(),
            "strategies": ["momentum", "mpt", "momentum"],
            "riskTolerance": "aggressive"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let summaries = body.as_object().unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.contains_key("momentum"));
    assert!(summaries.contains_key("mpt"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/rebalance/simulate",
        Some(json!({ "holdings": priced_holdings(), "strategies": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
