//! Domain events runtime bridge for the web server.
//!
//! Receives domain events via DomainEventSink, debounces them, and hands
//! each batch to the rebalancing service so stale cached analyses are evicted.

mod queue_worker;
mod sink;

pub use sink::WebDomainEventSink;
