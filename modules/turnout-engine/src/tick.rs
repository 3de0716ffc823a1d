//! The periodic severity tick, and the simulation start/stop lifecycle.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use turnout_common::{
    Capability, DispatchError, Incident, IncidentStatus, ResourceStatus, SimulationState,
};
use turnout_events::{AppendEvent, EntityKind, EventKind};
use turnout_store::WriteBatch;

use crate::scheduler::Job;
use crate::DispatchEngine;

/// Severity drops by this much per tick when the on-scene response meets the
/// recommendation.
const SEVERITY_STEP_DOWN: i32 = 2;
/// And climbs by this much when it does not.
const SEVERITY_STEP_UP: i32 = 3;
/// At or below this, an ACTIVE incident is contained.
const CONTAINMENT_THRESHOLD: i32 = 10;

impl DispatchEngine {
    /// Flip the simulation on and arrange the recurring tick. The scheduler
    /// handle lives in the persisted state, not in ambient process memory,
    /// so a stale registration from an earlier start is cancelled first.
    pub async fn start(&self) -> Result<SimulationState, DispatchError> {
        let mut state = self.store.simulation_state().await?;
        if let Some(handle) = state.tick_job.take() {
            self.scheduler.cancel(handle);
        }
        let handle = self
            .scheduler
            .schedule_recurring(Job::Tick, Duration::from_millis(self.config.tick_interval_ms));
        state.is_running = true;
        state.started_at = Some(Utc::now());
        state.paused_at = None;
        state.tick_job = Some(handle);
        self.store
            .commit(WriteBatch::new().put_simulation_state(state.clone()))
            .await?;
        info!(interval_ms = self.config.tick_interval_ms, "simulation started");
        Ok(state)
    }

    /// Cancel the recurring tick (a no-op when none is registered) and flip
    /// the running flag off. Always succeeds from the caller's point of view;
    /// a tick already in flight still runs to completion.
    pub async fn stop(&self) -> Result<SimulationState, DispatchError> {
        let mut state = self.store.simulation_state().await?;
        if let Some(handle) = state.tick_job.take() {
            self.scheduler.cancel(handle);
        }
        state.is_running = false;
        state.paused_at = Some(Utc::now());
        self.store
            .commit(WriteBatch::new().put_simulation_state(state.clone()))
            .await?;
        info!("simulation stopped");
        Ok(state)
    }

    pub async fn simulation_state(&self) -> Result<SimulationState, DispatchError> {
        Ok(self.store.simulation_state().await?)
    }

    /// One tick: re-evaluate every ACTIVE incident, adjust severity, contain
    /// what has burned down, and occasionally emit narrative noise. Idle
    /// single return when the simulation is not running.
    pub async fn tick(&self) -> Result<(), DispatchError> {
        let state = self.store.simulation_state().await?;
        if !state.is_running {
            return Ok(());
        }

        let active = self
            .store
            .incidents_by_status(IncidentStatus::Active)
            .await?;
        debug!(incidents = active.len(), "tick");
        for incident in active {
            self.tick_incident(incident).await?;
        }

        // One roll per tick; at most one cosmetic call update. State is never
        // mutated here, only the observable timeline.
        if self.random.roll() < self.config.call_update_probability {
            let mut fresh = self
                .store
                .incidents_by_status(IncidentStatus::New)
                .await?;
            if fresh.is_empty() {
                fresh = self
                    .store
                    .incidents_by_status(IncidentStatus::Triaged)
                    .await?;
            }
            if let Some(incident) = fresh.into_iter().next() {
                self.recorder
                    .record(
                        AppendEvent::new(EventKind::CallUpdate, EntityKind::Incident, incident.id)
                            .with_payload(json!({ "note": "Simulated call update" }))
                            .with_incident(incident.id),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn tick_incident(&self, incident: Incident) -> Result<(), DispatchError> {
        let recommended = self
            .evaluate(
                incident.incident_type,
                incident.priority,
                incident.people_inside_unknown,
            )
            .await?;

        let mut on_scene_counts: HashMap<Capability, u32> = HashMap::new();
        for assignment in self.store.assignments_for_incident(incident.id).await? {
            let Some(resource) = self.store.resource(assignment.resource_id).await? else {
                continue;
            };
            if resource.status == ResourceStatus::OnScene {
                for cap in &resource.capabilities {
                    *on_scene_counts.entry(*cap).or_insert(0) += 1;
                }
            }
        }

        // Vacuously met when there is nothing to recommend.
        let meets_recommendation = recommended.as_ref().map_or(true, |rec| {
            rec.required_capabilities.iter().all(|cap| {
                let have = on_scene_counts.get(cap).copied().unwrap_or(0);
                let need = rec.minimum_counts.get(cap).copied().unwrap_or(1);
                have >= need
            })
        });

        // The severity write goes against a fresh read; an incident that left
        // ACTIVE since the snapshot (a close landing mid-tick) is left alone.
        let Some(mut incident) = self.store.incident(incident.id).await? else {
            return Ok(());
        };
        if incident.status != IncidentStatus::Active {
            return Ok(());
        }

        let before = incident.severity;
        if meets_recommendation {
            incident.set_severity(before - SEVERITY_STEP_DOWN);
        } else {
            incident.set_severity(before + SEVERITY_STEP_UP);
        }
        let after = incident.severity;

        let contained = after <= CONTAINMENT_THRESHOLD;
        if contained {
            incident.status = IncidentStatus::Contained;
        }
        if after == before && !contained {
            return Ok(());
        }

        // Severity and containment commit together.
        self.store
            .commit(WriteBatch::new().put_incident(incident.clone()))
            .await?;

        if after != before {
            self.recorder
                .record(
                    AppendEvent::new(EventKind::SeverityChange, EntityKind::Incident, incident.id)
                        .with_payload(json!({ "from": before, "to": after }))
                        .with_incident(incident.id),
                )
                .await?;
        }
        if contained {
            self.recorder
                .record(
                    AppendEvent::new(
                        EventKind::IncidentContained,
                        EntityKind::Incident,
                        incident.id,
                    )
                    .with_incident(incident.id),
                )
                .await?;
            info!(incident = %incident.id, "incident contained");
        }
        Ok(())
    }
}
