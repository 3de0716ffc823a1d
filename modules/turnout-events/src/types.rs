//! Core types for the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    IncidentCreated,
    IncidentTriaged,
    IncidentDispatched,
    IncidentActive,
    IncidentContained,
    IncidentClosed,
    ResourceMobilised,
    ResourceEnroute,
    ResourceOnScene,
    ResourceReturning,
    ResourceAvailable,
    CallUpdate,
    SeverityChange,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::IncidentCreated,
        EventKind::IncidentTriaged,
        EventKind::IncidentDispatched,
        EventKind::IncidentActive,
        EventKind::IncidentContained,
        EventKind::IncidentClosed,
        EventKind::ResourceMobilised,
        EventKind::ResourceEnroute,
        EventKind::ResourceOnScene,
        EventKind::ResourceReturning,
        EventKind::ResourceAvailable,
        EventKind::CallUpdate,
        EventKind::SeverityChange,
    ];

    /// The wire spelling. Display and the serde impls all go through here.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::IncidentCreated => "INCIDENT_CREATED",
            EventKind::IncidentTriaged => "INCIDENT_TRIAGED",
            EventKind::IncidentDispatched => "INCIDENT_DISPATCHED",
            EventKind::IncidentActive => "INCIDENT_ACTIVE",
            EventKind::IncidentContained => "INCIDENT_CONTAINED",
            EventKind::IncidentClosed => "INCIDENT_CLOSED",
            EventKind::ResourceMobilised => "RESOURCE_MOBILISED",
            EventKind::ResourceEnroute => "RESOURCE_ENROUTE",
            EventKind::ResourceOnScene => "RESOURCE_ON_SCENE",
            EventKind::ResourceReturning => "RESOURCE_RETURNING",
            EventKind::ResourceAvailable => "RESOURCE_AVAILABLE",
            EventKind::CallUpdate => "CALL_UPDATE",
            EventKind::SeverityChange => "SEVERITY_CHANGE",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown event kind: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Incident,
    Resource,
    System,
}

/// An entry as stored in the log. Immutable once appended; the log's append
/// order is the total order (creation-time ascending).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Uuid,
    pub kind: EventKind,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub payload: serde_json::Value,
    /// Correlates resource/system entries back to an incident timeline.
    pub incident_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// An entry to be appended. The caller builds this; the log assigns id and
/// timestamp.
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub kind: EventKind,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub payload: serde_json::Value,
    pub incident_id: Option<Uuid>,
}

impl AppendEvent {
    pub fn new(kind: EventKind, entity_kind: EntityKind, entity_id: Uuid) -> Self {
        Self {
            kind,
            entity_kind,
            entity_id,
            payload: serde_json::Value::Object(Default::default()),
            incident_id: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_incident(mut self, incident_id: Uuid) -> Self {
        self.incident_id = Some(incident_id);
        self
    }
}
