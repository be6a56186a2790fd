pub mod holdings;
pub mod rebalancing;
