//! Incident/resource state machine.
//!
//! Status changes happen only here and in the travel/tick paths; every
//! multi-row mutation commits as one batch so concurrent readers never see a
//! half-applied dispatch or close.

use chrono::Utc;
use serde_json::json;
use tracing::info;
use turnout_common::{
    Assignment, DispatchError, Incident, IncidentStatus, IncidentType, Recommendation,
    ResourceStatus,
};
use turnout_events::{AppendEvent, EntityKind, EventKind};
use turnout_store::WriteBatch;
use uuid::Uuid;

use crate::DispatchEngine;

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub incident_type: IncidentType,
    pub priority: u8,
    pub lat: f64,
    pub lng: f64,
    pub label: Option<String>,
    pub people_inside_unknown: bool,
    pub severity: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    pub resource_id: Uuid,
    pub role: Option<String>,
}

/// An incident together with its assignments and the current recommendation.
#[derive(Debug, Clone)]
pub struct IncidentDetail {
    pub incident: Incident,
    pub assignments: Vec<Assignment>,
    pub recommended: Option<Recommendation>,
}

impl DispatchEngine {
    pub async fn create_incident(&self, new: NewIncident) -> Result<Incident, DispatchError> {
        if !(1..=5).contains(&new.priority) {
            return Err(DispatchError::Validation(format!(
                "priority {} outside 1-5",
                new.priority
            )));
        }
        let mut incident = Incident {
            id: Uuid::new_v4(),
            incident_type: new.incident_type,
            priority: new.priority,
            lat: new.lat,
            lng: new.lng,
            label: new.label,
            severity: 0,
            people_inside_unknown: new.people_inside_unknown,
            status: IncidentStatus::New,
            created_at: Utc::now(),
            closed_at: None,
        };
        incident.set_severity(new.severity.unwrap_or(self.config.default_severity));
        self.store.insert_incident(incident.clone()).await?;

        self.recorder
            .record(
                AppendEvent::new(EventKind::IncidentCreated, EntityKind::Incident, incident.id)
                    .with_payload(json!({
                        "type": incident.incident_type,
                        "priority": incident.priority,
                        "location": { "lat": incident.lat, "lng": incident.lng },
                    }))
                    .with_incident(incident.id),
            )
            .await?;

        info!(incident = %incident.id, kind = %incident.incident_type, "incident created");
        Ok(incident)
    }

    /// The incident with its assignments and a fresh recommendation attached.
    pub async fn incident_detail(&self, id: Uuid) -> Result<IncidentDetail, DispatchError> {
        let incident = self
            .store
            .incident(id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("incident {id}")))?;
        let assignments = self.store.assignments_for_incident(id).await?;
        let recommended = self
            .evaluate(
                incident.incident_type,
                incident.priority,
                incident.people_inside_unknown,
            )
            .await?;
        Ok(IncidentDetail {
            incident,
            assignments,
            recommended,
        })
    }

    /// Assign resources and move the incident to DISPATCHED. All assignment
    /// and resource writes plus the incident status write are one batch; if
    /// anything is invalid, nothing is applied.
    pub async fn dispatch(
        &self,
        incident_id: Uuid,
        requests: &[AssignmentRequest],
    ) -> Result<Incident, DispatchError> {
        let mut incident = self
            .store
            .incident(incident_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("incident {incident_id}")))?;
        if incident.status == IncidentStatus::Closed {
            return Err(DispatchError::InvalidStateTransition(
                "cannot dispatch a closed incident".into(),
            ));
        }

        // Resolve every resource up front so a bad id fails before any write.
        let mut resources = Vec::with_capacity(requests.len());
        for request in requests {
            let resource = self
                .store
                .resource(request.resource_id)
                .await?
                .ok_or_else(|| DispatchError::NotFound(format!("resource {}", request.resource_id)))?;
            resources.push(resource);
        }

        let now = Utc::now();
        let mut batch = WriteBatch::new();
        for (request, resource) in requests.iter().zip(resources.iter_mut()) {
            batch = batch.upsert_assignment(Assignment {
                incident_id,
                resource_id: resource.id,
                role: request.role.clone(),
            });
            resource.status = ResourceStatus::Mobilised;
            resource.current_incident_id = Some(incident_id);
            resource.status_changed_at = now;
            batch = batch.put_resource(resource.clone());
        }
        incident.status = IncidentStatus::Dispatched;
        batch = batch.put_incident(incident.clone());
        self.store.commit(batch).await?;

        self.recorder
            .record(
                AppendEvent::new(EventKind::IncidentDispatched, EntityKind::Incident, incident_id)
                    .with_payload(json!({
                        "assignments": requests.iter().map(|r| r.resource_id).collect::<Vec<_>>(),
                    }))
                    .with_incident(incident_id),
            )
            .await?;

        for resource in &resources {
            self.recorder
                .record(
                    AppendEvent::new(EventKind::ResourceMobilised, EntityKind::Resource, resource.id)
                        .with_payload(json!({
                            "incidentId": incident_id,
                            "callSign": resource.call_sign,
                        }))
                        .with_incident(incident_id),
                )
                .await?;
            self.plan_travel(
                resource.id,
                resource.station_id,
                incident_id,
                incident.lat,
                incident.lng,
            )
            .await?;
        }

        info!(incident = %incident_id, units = requests.len(), "incident dispatched");
        Ok(incident)
    }

    /// Close the incident and force-release every assigned resource back to
    /// AVAILABLE, whatever state it was in. Closing an already-closed
    /// incident is an idempotent no-op.
    pub async fn close(&self, incident_id: Uuid) -> Result<Incident, DispatchError> {
        let mut incident = self
            .store
            .incident(incident_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("incident {incident_id}")))?;
        if incident.status == IncidentStatus::Closed {
            return Ok(incident);
        }

        let now = Utc::now();
        incident.status = IncidentStatus::Closed;
        incident.closed_at = Some(now);

        let mut batch = WriteBatch::new().put_incident(incident.clone());
        for assignment in self.store.assignments_for_incident(incident_id).await? {
            if let Some(mut resource) = self.store.resource(assignment.resource_id).await? {
                resource.status = ResourceStatus::Available;
                resource.current_incident_id = None;
                resource.eta_minutes = None;
                resource.status_changed_at = now;
                batch = batch.put_resource(resource);
            }
        }
        self.store.commit(batch).await?;

        self.recorder
            .record(
                AppendEvent::new(EventKind::IncidentClosed, EntityKind::Incident, incident_id)
                    .with_incident(incident_id),
            )
            .await?;

        info!(incident = %incident_id, "incident closed");
        Ok(incident)
    }

    /// Administrative resource transitions (RETURNING, OFFLINE, back to
    /// AVAILABLE). Not driven by the simulation tick.
    pub async fn set_resource_status(
        &self,
        resource_id: Uuid,
        status: ResourceStatus,
    ) -> Result<(), DispatchError> {
        let mut resource = self
            .store
            .resource(resource_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("resource {resource_id}")))?;
        let incident_id = resource.current_incident_id;
        resource.status = status;
        resource.status_changed_at = Utc::now();
        if status == ResourceStatus::Available {
            resource.current_incident_id = None;
            resource.eta_minutes = None;
        }
        let call_sign = resource.call_sign.clone();
        self.store
            .commit(WriteBatch::new().put_resource(resource))
            .await?;

        let kind = match status {
            ResourceStatus::Returning => Some(EventKind::ResourceReturning),
            ResourceStatus::Available => Some(EventKind::ResourceAvailable),
            _ => None,
        };
        if let Some(kind) = kind {
            let mut event = AppendEvent::new(kind, EntityKind::Resource, resource_id)
                .with_payload(json!({ "callSign": call_sign }));
            if let Some(incident_id) = incident_id {
                event = event.with_incident(incident_id);
            }
            self.recorder.record(event).await?;
        }
        Ok(())
    }
}
