//! In-memory repository. One mutex guards all tables, so a committed batch is
//! observable only as a whole.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use turnout_common::{
    Assignment, Incident, IncidentStatus, Resource, RuleSet, SimulationState, Station,
};
use uuid::Uuid;

use crate::batch::{WriteBatch, WriteOp};
use crate::traits::Repository;

#[derive(Default)]
struct Tables {
    incidents: HashMap<Uuid, Incident>,
    resources: HashMap<Uuid, Resource>,
    stations: HashMap<Uuid, Station>,
    /// Insertion order preserved; assignments are history, never deleted.
    assignments: Vec<Assignment>,
    rule_sets: Vec<RuleSet>,
    simulation_state: Option<SimulationState>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn incident(&self, id: Uuid) -> Result<Option<Incident>> {
        Ok(self.tables.lock().unwrap().incidents.get(&id).cloned())
    }

    async fn incidents_by_status(&self, status: IncidentStatus) -> Result<Vec<Incident>> {
        let tables = self.tables.lock().unwrap();
        let mut incidents: Vec<Incident> = tables
            .incidents
            .values()
            .filter(|i| i.status == status)
            .cloned()
            .collect();
        incidents.sort_by_key(|i| i.created_at);
        Ok(incidents)
    }

    async fn insert_incident(&self, incident: Incident) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .incidents
            .insert(incident.id, incident);
        Ok(())
    }

    async fn resource(&self, id: Uuid) -> Result<Option<Resource>> {
        Ok(self.tables.lock().unwrap().resources.get(&id).cloned())
    }

    async fn resources(&self) -> Result<Vec<Resource>> {
        let tables = self.tables.lock().unwrap();
        let mut resources: Vec<Resource> = tables.resources.values().cloned().collect();
        resources.sort_by(|a, b| a.call_sign.cmp(&b.call_sign));
        Ok(resources)
    }

    async fn insert_resource(&self, resource: Resource) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .resources
            .insert(resource.id, resource);
        Ok(())
    }

    async fn station(&self, id: Uuid) -> Result<Option<Station>> {
        Ok(self.tables.lock().unwrap().stations.get(&id).cloned())
    }

    async fn stations(&self) -> Result<Vec<Station>> {
        let tables = self.tables.lock().unwrap();
        let mut stations: Vec<Station> = tables.stations.values().cloned().collect();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }

    async fn insert_station(&self, station: Station) -> Result<()> {
        self.tables
            .lock()
            .unwrap()
            .stations
            .insert(station.id, station);
        Ok(())
    }

    async fn assignments_for_incident(&self, incident_id: Uuid) -> Result<Vec<Assignment>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .assignments
            .iter()
            .filter(|a| a.incident_id == incident_id)
            .cloned()
            .collect())
    }

    async fn rule_set(&self, id: Uuid) -> Result<Option<RuleSet>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.rule_sets.iter().find(|rs| rs.id == id).cloned())
    }

    async fn rule_sets(&self) -> Result<Vec<RuleSet>> {
        Ok(self.tables.lock().unwrap().rule_sets.clone())
    }

    async fn active_rule_set(&self) -> Result<Option<RuleSet>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.rule_sets.iter().find(|rs| rs.is_active).cloned())
    }

    async fn insert_rule_set(&self, rule_set: RuleSet) -> Result<()> {
        self.tables.lock().unwrap().rule_sets.push(rule_set);
        Ok(())
    }

    async fn simulation_state(&self) -> Result<SimulationState> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .simulation_state
            .get_or_insert_with(SimulationState::default)
            .clone())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();

        // Validate before touching anything; a failed batch leaves no trace.
        for op in &batch.ops {
            if let WriteOp::ActivateRuleSet(id) = op {
                if !tables.rule_sets.iter().any(|rs| rs.id == *id) {
                    return Err(anyhow!("rule set {id} does not exist"));
                }
            }
        }

        for op in batch.ops {
            match op {
                WriteOp::PutIncident(incident) => {
                    tables.incidents.insert(incident.id, incident);
                }
                WriteOp::PutResource(resource) => {
                    tables.resources.insert(resource.id, resource);
                }
                WriteOp::UpsertAssignment(assignment) => {
                    match tables.assignments.iter_mut().find(|a| {
                        a.incident_id == assignment.incident_id
                            && a.resource_id == assignment.resource_id
                    }) {
                        Some(existing) => existing.role = assignment.role,
                        None => tables.assignments.push(assignment),
                    }
                }
                WriteOp::ActivateRuleSet(id) => {
                    for rs in tables.rule_sets.iter_mut() {
                        rs.is_active = rs.id == id;
                    }
                }
                WriteOp::PutSimulationState(state) => {
                    tables.simulation_state = Some(state);
                }
            }
        }
        Ok(())
    }
}
