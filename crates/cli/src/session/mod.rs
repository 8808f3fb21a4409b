//! Dashboard session - wires producer, store, relay, display and console.

mod runner;
mod stats;

pub use runner::{Session, SessionConfig};
pub use stats::SessionStats;
