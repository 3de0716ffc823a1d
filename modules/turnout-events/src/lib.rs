//! Append-only event log and outward broadcast seam.
//!
//! Every state change the engine makes leaves exactly one trace here. The log
//! is the sole source of historical reconstruction (the AAR scorer reads it);
//! the sink is a fire-and-forget broadcast whose failures never roll back the
//! underlying mutation.

pub mod log;
pub mod recorder;
pub mod sink;
pub mod types;

pub use log::{EventLog, MemoryEventLog};
pub use recorder::Recorder;
pub use sink::{EventSink, MemorySink, NoopSink};
pub use types::{AppendEvent, EntityKind, EventKind, EventLogEntry};
