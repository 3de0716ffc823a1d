//! Outward broadcast seam. Publishing is best-effort; the realtime transport
//! behind it is an external collaborator.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::types::EventLogEntry;

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, entry: &EventLogEntry) -> Result<()>;
}

/// Discards everything. Default for headless runs.
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn publish(&self, _entry: &EventLogEntry) -> Result<()> {
        Ok(())
    }
}

/// Captures published entries for test assertions.
#[derive(Default)]
pub struct MemorySink {
    published: Mutex<Vec<EventLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<EventLogEntry> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, entry: &EventLogEntry) -> Result<()> {
        self.published.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    async fn publish(&self, entry: &EventLogEntry) -> Result<()> {
        (**self).publish(entry).await
    }
}
