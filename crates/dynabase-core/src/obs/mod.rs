//! Observability.
//!
//! Registry operations report through [`sink::EventSink`]; where the lines
//! end up is chosen by the caller.

pub mod sink;

pub use sink::{Event, EventSink, FileSink, MemorySink, NullSink, StderrSink};
