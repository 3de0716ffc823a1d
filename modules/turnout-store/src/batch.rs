//! Write batches, the unit of atomicity.

use turnout_common::{Assignment, Incident, Resource, SimulationState};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert-or-replace an incident by id.
    PutIncident(Incident),
    /// Insert-or-replace a resource by id.
    PutResource(Resource),
    /// Insert-or-update an assignment keyed by (incident, resource).
    /// Existing rows keep their place; only the role changes.
    UpsertAssignment(Assignment),
    /// Clear the active flag on every rule set, then set it on this one.
    ActivateRuleSet(Uuid),
    /// Replace the simulation-state singleton.
    PutSimulationState(SimulationState),
}

/// An ordered list of writes applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_incident(mut self, incident: Incident) -> Self {
        self.ops.push(WriteOp::PutIncident(incident));
        self
    }

    pub fn put_resource(mut self, resource: Resource) -> Self {
        self.ops.push(WriteOp::PutResource(resource));
        self
    }

    pub fn upsert_assignment(mut self, assignment: Assignment) -> Self {
        self.ops.push(WriteOp::UpsertAssignment(assignment));
        self
    }

    pub fn activate_rule_set(mut self, id: Uuid) -> Self {
        self.ops.push(WriteOp::ActivateRuleSet(id));
        self
    }

    pub fn put_simulation_state(mut self, state: SimulationState) -> Self {
        self.ops.push(WriteOp::PutSimulationState(state));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
