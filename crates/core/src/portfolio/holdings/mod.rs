//! Holdings priced for a single analysis pass.

mod holdings_model;

pub use holdings_model::*;
