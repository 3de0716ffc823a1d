//! Append-only fact store.
//!
//! Entries are never updated or deleted. Reads come back in append order,
//! which is creation-time ascending; the AAR scorer depends on that.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::types::{AppendEvent, EventLogEntry};

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append an entry; the log assigns id and timestamp.
    async fn append(&self, event: AppendEvent) -> Result<EventLogEntry>;

    /// All entries correlated to an incident, oldest first.
    async fn for_incident(&self, incident_id: Uuid) -> Result<Vec<EventLogEntry>>;

    /// Most recent entries across all incidents, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<EventLogEntry>>;
}

/// In-memory log. Thread-safe; the production store behind the repository
/// seam is an external concern.
#[derive(Default)]
pub struct MemoryEventLog {
    entries: Mutex<Vec<EventLogEntry>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far (for test assertions).
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Insert a pre-built entry as-is. Tests use this to backdate timestamps
    /// when reconstructing historical timelines.
    pub fn insert(&self, entry: EventLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, event: AppendEvent) -> Result<EventLogEntry> {
        let entry = EventLogEntry {
            id: Uuid::new_v4(),
            kind: event.kind,
            entity_kind: event.entity_kind,
            entity_id: event.entity_id,
            payload: event.payload,
            incident_id: event.incident_id,
            created_at: Utc::now(),
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn for_incident(&self, incident_id: Uuid) -> Result<Vec<EventLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.incident_id == Some(incident_id))
            .cloned()
            .collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<EventLogEntry>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl<L: EventLog + ?Sized> EventLog for Arc<L> {
    async fn append(&self, event: AppendEvent) -> Result<EventLogEntry> {
        (**self).append(event).await
    }

    async fn for_incident(&self, incident_id: Uuid) -> Result<Vec<EventLogEntry>> {
        (**self).for_incident(incident_id).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<EventLogEntry>> {
        (**self).recent(limit).await
    }
}
