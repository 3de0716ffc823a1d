//! Travel planning: ETA estimation plus the two deferred transitions that
//! move a mobilised resource through ENROUTE to ON_SCENE.
//!
//! Jobs are fire-and-forget and at-least-once; they run on their own
//! schedule long after the dispatching call has returned, so every execution
//! path tolerates state that moved on in the meantime.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use turnout_common::geo::estimate_travel_minutes;
use turnout_common::{DispatchError, IncidentStatus, ResourceStatus};
use turnout_events::{AppendEvent, EntityKind, EventKind};
use turnout_store::WriteBatch;
use uuid::Uuid;

use crate::scheduler::Job;
use crate::DispatchEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelPhase {
    Enroute,
    OnScene,
}

/// One deferred transition, keyed by (resource, incident, phase).
#[derive(Debug, Clone)]
pub struct TravelJob {
    pub resource_id: Uuid,
    pub incident_id: Uuid,
    pub phase: TravelPhase,
    pub eta_minutes: Option<u32>,
}

impl DispatchEngine {
    /// Compute the ETA from the resource's home station and arrange the two
    /// travel transitions. A missing station means no travel is arranged at
    /// all; callers must not assume a transition will follow dispatch.
    pub async fn plan_travel(
        &self,
        resource_id: Uuid,
        station_id: Uuid,
        incident_id: Uuid,
        incident_lat: f64,
        incident_lng: f64,
    ) -> Result<(), DispatchError> {
        let Some(station) = self.store.station(station_id).await? else {
            warn!(%station_id, %resource_id, "station not found; travel not scheduled");
            return Ok(());
        };

        let eta = estimate_travel_minutes(station.lat, station.lng, incident_lat, incident_lng);

        // Observers see a projected ETA immediately after dispatch.
        if let Some(mut resource) = self.store.resource(resource_id).await? {
            resource.eta_minutes = Some(eta);
            self.store
                .commit(WriteBatch::new().put_resource(resource))
                .await?;
        }

        self.scheduler.schedule(
            Job::Travel(TravelJob {
                resource_id,
                incident_id,
                phase: TravelPhase::Enroute,
                eta_minutes: Some(eta),
            }),
            Duration::ZERO,
        );
        self.scheduler.schedule(
            Job::Travel(TravelJob {
                resource_id,
                incident_id,
                phase: TravelPhase::OnScene,
                eta_minutes: None,
            }),
            Duration::from_secs(u64::from(eta) * 60),
        );
        Ok(())
    }

    /// Execute one travel transition. A vanished resource is a silent no-op.
    /// Arrival still updates the resource when the incident has since closed,
    /// but a closed incident is never pushed back to ACTIVE.
    pub async fn run_travel(&self, job: TravelJob) -> Result<(), DispatchError> {
        let Some(mut resource) = self.store.resource(job.resource_id).await? else {
            return Ok(());
        };

        match job.phase {
            TravelPhase::Enroute => {
                resource.status = ResourceStatus::Enroute;
                resource.eta_minutes = job.eta_minutes;
            }
            TravelPhase::OnScene => {
                resource.status = ResourceStatus::OnScene;
                resource.eta_minutes = None;
            }
        }
        resource.status_changed_at = Utc::now();
        let call_sign = resource.call_sign.clone();
        self.store
            .commit(WriteBatch::new().put_resource(resource))
            .await?;

        let kind = match job.phase {
            TravelPhase::Enroute => EventKind::ResourceEnroute,
            TravelPhase::OnScene => EventKind::ResourceOnScene,
        };
        self.recorder
            .record(
                AppendEvent::new(kind, EntityKind::Resource, job.resource_id)
                    .with_payload(json!({
                        "incidentId": job.incident_id,
                        "callSign": call_sign,
                    }))
                    .with_incident(job.incident_id),
            )
            .await?;

        if job.phase == TravelPhase::OnScene {
            if let Some(mut incident) = self.store.incident(job.incident_id).await? {
                // Only a DISPATCHED incident is promoted; anything later in
                // the lifecycle (including CLOSED) stays where it is.
                if incident.status == IncidentStatus::Dispatched {
                    incident.status = IncidentStatus::Active;
                    self.store
                        .commit(WriteBatch::new().put_incident(incident))
                        .await?;
                    self.recorder
                        .record(
                            AppendEvent::new(
                                EventKind::IncidentActive,
                                EntityKind::Incident,
                                job.incident_id,
                            )
                            .with_incident(job.incident_id),
                        )
                        .await?;
                }
            }
        }
        Ok(())
    }
}
