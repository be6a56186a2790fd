/// Default risk-free rate used by Sharpe/Sortino.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Default benchmark return used by the information ratio.
pub const DEFAULT_BENCHMARK_RETURN: f64 = 0.10;

/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Default trading fee rate (0.3%).
pub const DEFAULT_FEE_RATE: f64 = 0.003;

/// Minimum trade size in USD below which a rebalance trade is skipped.
pub const DEFAULT_MATERIALITY_THRESHOLD: i64 = 50;

/// Sharpe ratio the expected-improvement estimate measures distance against.
pub const DEFAULT_OPTIMAL_SHARPE: f64 = 1.0;

/// Default capacity of the optimization cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Per-asset drift above which an asset is flagged HIGH and a rebalance is needed.
pub const HIGH_DRIFT_THRESHOLD: f64 = 0.05;

/// Per-asset drift above which an asset is flagged MEDIUM.
pub const MEDIUM_DRIFT_THRESHOLD: f64 = 0.02;

/// Aggregate max drift above which overall status is HIGH.
pub const OVERALL_HIGH_DRIFT_THRESHOLD: f64 = 0.10;

/// Weight change below which an optimized entry is reported as HOLD.
pub const HOLD_WEIGHT_BAND: f64 = 0.01;

/// Share of portfolio above which a trade is HIGH priority.
pub const HIGH_PRIORITY_TRADE_PCT: f64 = 0.05;

/// Upper bound for the expected-improvement estimate.
pub const MAX_EXPECTED_IMPROVEMENT: f64 = 0.10;

/// Confidence penalty for assets whose signals came from a last-known fallback.
pub const STALE_DATA_CONFIDENCE_PENALTY: f64 = 0.10;

/// Large-cap symbols that receive a confidence bonus.
pub const MAJOR_SYMBOLS: &[&str] = &["BTC", "ETH"];

/// Stablecoin symbols. Treated as low risk and given the highest confidence.
pub const STABLECOIN_SYMBOLS: &[&str] = &["USDT", "USDC", "DAI", "BUSD", "TUSD", "FDUSD"];

/// Returns true if the symbol is a known stablecoin.
pub fn is_stablecoin(symbol: &str) -> bool {
    STABLECOIN_SYMBOLS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(symbol))
}

/// Returns true if the symbol is a large-cap major.
pub fn is_major(symbol: &str) -> bool {
    MAJOR_SYMBOLS.iter().any(|s| s.eq_ignore_ascii_case(symbol))
}
