//! # Dashboard
//!
//! In-process query interface between the display and the telemetry core.
//!
//! - [`DashboardService`]: effective state (latest snapshot merged with
//!   operator overrides) plus set/clear requests, forwarded to the producer
//!   when a relay is attached
//! - [`DashboardView`]: plain-text rendering of one display frame
//! - [`OperatorCommand`]: the console command language

pub mod console;
pub mod error;
pub mod service;
pub mod view;

pub use console::{execute, ConsoleReply, OperatorCommand};
pub use error::{ConsoleError, DashboardError};
pub use service::{DashboardService, DashboardStatus, DisplayFrame};
pub use view::{gauge_percent, DashboardView};
