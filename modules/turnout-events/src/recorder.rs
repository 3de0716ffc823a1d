//! The one door through which the engine emits events.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::log::EventLog;
use crate::sink::EventSink;
use crate::types::{AppendEvent, EventLogEntry};

/// Appends to the durable log, then broadcasts. A broadcast failure is logged
/// and swallowed; the append has already committed and stays committed.
#[derive(Clone)]
pub struct Recorder {
    log: Arc<dyn EventLog>,
    sink: Arc<dyn EventSink>,
}

impl Recorder {
    pub fn new(log: Arc<dyn EventLog>, sink: Arc<dyn EventSink>) -> Self {
        Self { log, sink }
    }

    pub async fn record(&self, event: AppendEvent) -> Result<EventLogEntry> {
        let entry = self.log.append(event).await?;
        if let Err(e) = self.sink.publish(&entry).await {
            warn!(kind = %entry.kind, error = %e, "event broadcast failed");
        }
        Ok(entry)
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }
}
