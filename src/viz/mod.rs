//! Visualization sinks.

pub mod rerun;

pub use rerun::RerunSink;
