//! Outbound channel for domain events.

use super::DomainEvent;

/// Receiver of domain events.
///
/// `emit()` is called on the request path right after market data is
/// written, so implementations only enqueue. Dropped events cost at most a
/// stale cache entry until the next refresh; they never fail the write.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);

    fn emit_batch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
