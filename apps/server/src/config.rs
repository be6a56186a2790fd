use std::{net::SocketAddr, str::FromStr, time::Duration};

use cryptofolio_core::EngineConfig;
use rust_decimal::Decimal;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8088";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub refresh_interval: Duration,
    pub log_format: LogFormat,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_or("CF_LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8088)));
        let cors_allow = env_or("CF_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let refresh_secs = parse_env("CF_REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS);
        let log_format = match env_or("CF_LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            risk_free_rate: parse_env("CF_RISK_FREE_RATE", defaults.risk_free_rate),
            fee_rate: parse_env("CF_FEE_RATE", defaults.fee_rate),
            materiality_threshold: parse_env::<Decimal>(
                "CF_MATERIALITY_USD",
                defaults.materiality_threshold,
            ),
            cache_capacity: parse_env("CF_CACHE_CAPACITY", defaults.cache_capacity),
            ..defaults
        };

        Self {
            listen_addr,
            cors_allow,
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            log_format,
            engine,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8088)),
            cors_allow: vec!["*".to_string()],
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            log_format: LogFormat::Text,
            engine: EngineConfig::default(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
