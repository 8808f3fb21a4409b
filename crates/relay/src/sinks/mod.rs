//! Command sink implementations

mod log;
mod pipe;

pub use log::LogSink;
pub use pipe::PipeSink;
