//! Domain types for the dispatch simulator.
//!
//! Incidents and resources are plain records; all status changes go through
//! the engine's transition operations, never by poking fields from outside.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What an appliance can do. Closed set; order not significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    Pump,
    Rescue,
    Command,
    WaterSupplySupport,
    HazmatSupport,
    MedicalSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    HouseFire,
    VehicleCrash,
    VegetationFire,
    MedicalAssist,
    HazmatSuspected,
    AlarmActivation,
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IncidentType::HouseFire => "HOUSE_FIRE",
            IncidentType::VehicleCrash => "VEHICLE_CRASH",
            IncidentType::VegetationFire => "VEGETATION_FIRE",
            IncidentType::MedicalAssist => "MEDICAL_ASSIST",
            IncidentType::HazmatSuspected => "HAZMAT_SUSPECTED",
            IncidentType::AlarmActivation => "ALARM_ACTIVATION",
        };
        write!(f, "{s}")
    }
}

/// Incident lifecycle. The only legal forward order is
/// NEW → TRIAGED → DISPATCHED → ACTIVE → CONTAINED → CLOSED; CLOSED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    New,
    Triaged,
    Dispatched,
    Active,
    Contained,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Available,
    Mobilised,
    Enroute,
    OnScene,
    Returning,
    Offline,
}

// ---------------------------------------------------------------------------
// Incident / Resource / Station / Assignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub incident_type: IncidentType,
    /// 1 is most urgent, 5 least.
    pub priority: u8,
    pub lat: f64,
    pub lng: f64,
    pub label: Option<String>,
    /// 0–100; always written through `set_severity`.
    pub severity: i32,
    pub people_inside_unknown: bool,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Incident {
    /// Clamped severity write. Every mutation path goes through here.
    pub fn set_severity(&mut self, value: i32) {
        self.severity = value.clamp(0, 100);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub station_id: Uuid,
    pub call_sign: String,
    pub capabilities: Vec<Capability>,
    pub status: ResourceStatus,
    /// Weak back-reference while mobilised; cleared on return to AVAILABLE.
    pub current_incident_id: Option<Uuid>,
    pub eta_minutes: Option<u32>,
    pub status_changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub address: Option<String>,
}

/// Links one incident to one resource. Unique per (incident, resource) pair;
/// created by dispatch, never deleted, role updated in place on re-dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub incident_id: Uuid,
    pub resource_id: Uuid,
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Match condition for a rule. An absent dimension matches anything; both
/// absent means the rule always matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_types: Option<Vec<IncidentType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<Vec<u8>>,
}

impl RuleCondition {
    pub fn matches(&self, incident_type: IncidentType, priority: u8) -> bool {
        if let Some(types) = &self.incident_types {
            if !types.contains(&incident_type) {
                return false;
            }
        }
        if let Some(priorities) = &self.priorities {
            if !priorities.contains(&priority) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecommend {
    pub required_capabilities: Vec<Capability>,
    /// Minimums per listed capability; a missing entry means 1.
    #[serde(default)]
    pub minimum_counts: BTreeMap<Capability, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_travel_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub priority: i32,
    pub when: RuleCondition,
    pub recommend: RuleRecommend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: Uuid,
    pub name: String,
    pub version: u32,
    pub is_active: bool,
    pub description: Option<String>,
    /// Insertion order is preserved; it is the tie-breaker for equal priorities.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Rules ordered priority-descending. The sort is stable, so rules with
    /// equal priority keep their insertion order.
    pub fn rules_by_priority(&self) -> Vec<&Rule> {
        let mut ordered: Vec<&Rule> = self.rules.iter().collect();
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        ordered
    }
}

/// What the rule engine hands back for a matched context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub required_capabilities: Vec<Capability>,
    /// Fully populated: every required capability has an entry (default 1).
    pub minimum_counts: BTreeMap<Capability, u32>,
    pub max_travel_minutes: Option<u32>,
    pub explanation: String,
    pub rule_name: String,
}

impl Recommendation {
    /// Sum of per-capability minimums; the baseline unit count for scoring.
    pub fn total_recommended(&self) -> u32 {
        self.minimum_counts.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Opaque handle to a scheduled recurring job. Stored with the simulation
/// state so restarts and multiple instances can see what is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub u64);

/// Process-wide singleton; created lazily on first read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationState {
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    /// Handle of the recurring tick job, if one is registered.
    pub tick_job: Option<JobHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_clamped_on_write() {
        let mut incident = Incident {
            id: Uuid::new_v4(),
            incident_type: IncidentType::HouseFire,
            priority: 1,
            lat: 0.0,
            lng: 0.0,
            label: None,
            severity: 50,
            people_inside_unknown: false,
            status: IncidentStatus::New,
            created_at: Utc::now(),
            closed_at: None,
        };
        incident.set_severity(130);
        assert_eq!(incident.severity, 100);
        incident.set_severity(-5);
        assert_eq!(incident.severity, 0);
    }

    #[test]
    fn empty_condition_matches_everything() {
        let when = RuleCondition::default();
        assert!(when.matches(IncidentType::HouseFire, 1));
        assert!(when.matches(IncidentType::AlarmActivation, 5));
    }

    #[test]
    fn condition_dimensions_are_independent() {
        let when = RuleCondition {
            incident_types: Some(vec![IncidentType::HouseFire]),
            priorities: Some(vec![1, 2]),
        };
        assert!(when.matches(IncidentType::HouseFire, 2));
        assert!(!when.matches(IncidentType::HouseFire, 4));
        assert!(!when.matches(IncidentType::VehicleCrash, 1));
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let rule = |name: &str, priority: i32| Rule {
            name: name.to_string(),
            priority,
            when: RuleCondition::default(),
            recommend: RuleRecommend {
                required_capabilities: vec![Capability::Pump],
                minimum_counts: BTreeMap::new(),
                max_travel_minutes: None,
            },
        };
        let set = RuleSet {
            id: Uuid::new_v4(),
            name: "test".into(),
            version: 1,
            is_active: true,
            description: None,
            rules: vec![rule("first", 50), rule("second", 50), rule("top", 90)],
        };
        let ordered = set.rules_by_priority();
        assert_eq!(ordered[0].name, "top");
        assert_eq!(ordered[1].name, "first");
        assert_eq!(ordered[2].name, "second");
    }
}
