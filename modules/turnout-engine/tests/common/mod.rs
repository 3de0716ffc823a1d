//! Shared harness: memory store, memory log, captured sink, manual scheduler.

use std::sync::Arc;

use chrono::Utc;
use turnout_common::{
    Capability, Config, Incident, IncidentStatus, IncidentType, Resource, ResourceStatus, Station,
};
use turnout_engine::{DispatchEngine, FixedRandom, ManualScheduler};
use turnout_events::{MemoryEventLog, MemorySink, Recorder};
use turnout_store::{MemoryStore, Repository};
use uuid::Uuid;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub log: Arc<MemoryEventLog>,
    pub sink: Arc<MemorySink>,
    pub scheduler: Arc<ManualScheduler>,
    pub engine: DispatchEngine,
}

/// Engine wired to memory everything; the call-update roll always misses.
pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let sink = Arc::new(MemorySink::new());
    let scheduler = Arc::new(ManualScheduler::new());
    let engine = DispatchEngine::new(
        store.clone() as Arc<dyn Repository>,
        Recorder::new(log.clone(), sink.clone()),
        scheduler.clone(),
        Config::default(),
    )
    .with_random(Arc::new(FixedRandom(1.0)));
    Harness {
        store,
        log,
        sink,
        scheduler,
        engine,
    }
}

pub async fn seed_station(store: &MemoryStore, lat: f64, lng: f64) -> Station {
    let station = Station {
        id: Uuid::new_v4(),
        name: "Morrinsville".into(),
        lat,
        lng,
        address: None,
    };
    store.insert_station(station.clone()).await.unwrap();
    station
}

pub async fn seed_resource(
    store: &MemoryStore,
    station_id: Uuid,
    call_sign: &str,
    capabilities: &[Capability],
) -> Resource {
    let resource = Resource {
        id: Uuid::new_v4(),
        station_id,
        call_sign: call_sign.into(),
        capabilities: capabilities.to_vec(),
        status: ResourceStatus::Available,
        current_incident_id: None,
        eta_minutes: None,
        status_changed_at: Utc::now(),
    };
    store.insert_resource(resource.clone()).await.unwrap();
    resource
}

pub async fn seed_incident(
    store: &MemoryStore,
    status: IncidentStatus,
    severity: i32,
) -> Incident {
    let incident = Incident {
        id: Uuid::new_v4(),
        incident_type: IncidentType::HouseFire,
        priority: 2,
        lat: -37.66,
        lng: 175.54,
        label: None,
        severity,
        people_inside_unknown: false,
        status,
        created_at: Utc::now(),
        closed_at: None,
    };
    store.insert_incident(incident.clone()).await.unwrap();
    incident
}
