//! Background scheduler that refreshes cached analyses against the latest
//! market data.

use std::sync::Arc;

use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Initial delay before the first refresh, giving quote feeders time to connect.
const INITIAL_DELAY_SECS: u64 = 30;

pub fn start_refresh_scheduler(state: Arc<AppState>, every: Duration) {
    tokio::spawn(async move {
        info!("Analysis refresh scheduler started ({}s interval)", every.as_secs());

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut refresh_interval = interval(every);
        loop {
            refresh_interval.tick().await;
            run_scheduled_refresh(&state).await;
        }
    });
}

async fn run_scheduled_refresh(state: &AppState) {
    match state.rebalancing_service.refresh_cached().await {
        Ok(0) => debug!("Scheduled refresh: nothing to refresh"),
        Ok(count) => info!("Scheduled refresh updated {} cached analyses", count),
        Err(e) => warn!("Scheduled refresh failed: {}", e),
    }
}
