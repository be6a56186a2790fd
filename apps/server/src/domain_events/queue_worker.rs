//! Event queue worker for processing domain events.
//!
//! Receives events from an mpsc channel and collects them into batches. A
//! batch is flushed 500ms after its first event arrives, or as soon as it
//! reaches the size cap, then applied to the rebalancing service's cache.

use std::sync::Arc;
use std::time::Duration;

use cryptofolio_core::events::DomainEvent;
use cryptofolio_core::RebalancingServiceTrait;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Window measured from the first event of a batch.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

/// Pending events that force an immediate flush.
const MAX_BATCH_SIZE: usize = 1024;

/// Runs the event queue worker until the channel closes.
pub async fn event_queue_worker(
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
    rebalancing_service: Arc<dyn RebalancingServiceTrait>,
) {
    tracing::info!("Domain event queue worker started");

    let mut pending_events: Vec<DomainEvent> = Vec::new();
    let mut flush_at: Option<Instant> = None;

    loop {
        let Some(deadline) = flush_at else {
            match rx.recv().await {
                Some(e) => {
                    pending_events.push(e);
                    flush_at = Some(Instant::now() + DEBOUNCE_DURATION);
                }
                None => break,
            }
            continue;
        };

        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(e) => {
                        pending_events.push(e);
                        if pending_events.len() >= MAX_BATCH_SIZE {
                            let batch = std::mem::take(&mut pending_events);
                            process_event_batch(&batch, rebalancing_service.as_ref());
                            flush_at = None;
                        }
                    }
                    None => {
                        process_event_batch(&pending_events, rebalancing_service.as_ref());
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(deadline) => {
                let batch = std::mem::take(&mut pending_events);
                process_event_batch(&batch, rebalancing_service.as_ref());
                flush_at = None;
            }
        }
    }

    tracing::info!("Domain event queue worker shutting down");
}

/// Applies a batch of events. Consecutive duplicates are collapsed, and a
/// sentiment change makes every other event in the batch redundant.
pub(crate) fn process_event_batch(
    events: &[DomainEvent],
    rebalancing_service: &dyn RebalancingServiceTrait,
) -> usize {
    if events.is_empty() {
        return 0;
    }

    let mut batch: Vec<&DomainEvent> = events.iter().collect();
    batch.dedup();
    if batch
        .iter()
        .any(|e| matches!(e, DomainEvent::MarketSentimentChanged))
    {
        batch.retain(|e| matches!(e, DomainEvent::MarketSentimentChanged));
        batch.truncate(1);
    }

    let evicted: usize = batch
        .iter()
        .map(|event| rebalancing_service.handle_event(event))
        .sum();

    tracing::debug!(
        "Processed {} domain events ({} applied), evicted {} cached analyses",
        events.len(),
        batch.len(),
        evicted
    );
    evicted
}
