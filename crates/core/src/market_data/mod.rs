//! Market data collaborator contract and an in-memory implementation.

mod feed;
mod in_memory;
mod market_data_model;
mod market_data_traits;

pub use feed::{FeedUpdate, MarketDataFeed};
pub use in_memory::InMemoryMarketData;
pub use market_data_model::*;
pub use market_data_traits::*;
