//! # Overrides
//!
//! Operator override table and the merge that produces the effective state.
//!
//! An override replaces (or bounds) one sensor reading until cleared. It
//! survives snapshot replacement. Actuators, alerts and the timestamp are
//! never touched.

mod table;

pub use contracts::{OverridePolicy, OverrideValue};
pub use table::OverrideTable;
