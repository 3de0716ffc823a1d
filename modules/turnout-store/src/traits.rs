use anyhow::Result;
use async_trait::async_trait;
use turnout_common::{
    Assignment, Incident, IncidentStatus, Resource, RuleSet, SimulationState, Station,
};
use uuid::Uuid;

use crate::batch::WriteBatch;

/// Transactional storage seam. Reads are point-in-time snapshots; all
/// mutations go through `commit`, which applies a batch atomically.
///
/// Transient storage failures are the implementation's concern; callers
/// assume a commit either fully applies or fully fails.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Incidents ---
    async fn incident(&self, id: Uuid) -> Result<Option<Incident>>;
    async fn incidents_by_status(&self, status: IncidentStatus) -> Result<Vec<Incident>>;
    async fn insert_incident(&self, incident: Incident) -> Result<()>;

    // --- Resources / stations ---
    async fn resource(&self, id: Uuid) -> Result<Option<Resource>>;
    async fn resources(&self) -> Result<Vec<Resource>>;
    async fn insert_resource(&self, resource: Resource) -> Result<()>;
    async fn station(&self, id: Uuid) -> Result<Option<Station>>;
    async fn stations(&self) -> Result<Vec<Station>>;
    async fn insert_station(&self, station: Station) -> Result<()>;

    // --- Assignments ---
    async fn assignments_for_incident(&self, incident_id: Uuid) -> Result<Vec<Assignment>>;

    // --- Rule sets ---
    async fn rule_set(&self, id: Uuid) -> Result<Option<RuleSet>>;
    async fn rule_sets(&self) -> Result<Vec<RuleSet>>;
    /// The at-most-one rule set whose active flag is set.
    async fn active_rule_set(&self) -> Result<Option<RuleSet>>;
    async fn insert_rule_set(&self, rule_set: RuleSet) -> Result<()>;

    // --- Simulation state ---
    /// The singleton record, created lazily on first read.
    async fn simulation_state(&self) -> Result<SimulationState>;

    // --- Atomic multi-write ---
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}
