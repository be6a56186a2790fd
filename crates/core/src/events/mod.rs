//! Domain events module.
//!
//! Provides domain event types and the sink trait used to propagate price
//! ticks and composition changes to the rebalancing service as explicit
//! messages.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
