//! Batch atomicity and table semantics of the in-memory repository.

use chrono::Utc;
use turnout_common::{
    Assignment, Incident, IncidentStatus, IncidentType, Rule, RuleCondition, RuleRecommend,
    RuleSet,
};
use turnout_store::{MemoryStore, Repository, WriteBatch};
use uuid::Uuid;

fn incident(status: IncidentStatus) -> Incident {
    Incident {
        id: Uuid::new_v4(),
        incident_type: IncidentType::HouseFire,
        priority: 2,
        lat: -37.66,
        lng: 175.54,
        label: None,
        severity: 50,
        people_inside_unknown: false,
        status,
        created_at: Utc::now(),
        closed_at: None,
    }
}

fn rule_set(name: &str) -> RuleSet {
    RuleSet {
        id: Uuid::new_v4(),
        name: name.into(),
        version: 1,
        is_active: false,
        description: None,
        rules: vec![Rule {
            name: "any".into(),
            priority: 1,
            when: RuleCondition::default(),
            recommend: RuleRecommend {
                required_capabilities: vec![turnout_common::Capability::Pump],
                minimum_counts: Default::default(),
                max_travel_minutes: None,
            },
        }],
    }
}

fn assignment(incident_id: Uuid, resource_id: Uuid, role: Option<&str>) -> Assignment {
    Assignment {
        incident_id,
        resource_id,
        role: role.map(Into::into),
    }
}

#[tokio::test]
async fn failed_batch_applies_nothing() {
    let store = MemoryStore::new();
    let fresh = incident(IncidentStatus::New);

    let batch = WriteBatch::new()
        .put_incident(fresh.clone())
        .activate_rule_set(Uuid::new_v4());
    assert!(store.commit(batch).await.is_err());

    // The put ahead of the failing activation is not visible either.
    assert!(store.incident(fresh.id).await.unwrap().is_none());
}

#[tokio::test]
async fn activation_is_exclusive_across_the_table() {
    let store = MemoryStore::new();
    let a = rule_set("a");
    let b = rule_set("b");
    store.insert_rule_set(a.clone()).await.unwrap();
    store.insert_rule_set(b.clone()).await.unwrap();

    store
        .commit(WriteBatch::new().activate_rule_set(a.id))
        .await
        .unwrap();
    store
        .commit(WriteBatch::new().activate_rule_set(b.id))
        .await
        .unwrap();

    let active = store.active_rule_set().await.unwrap().unwrap();
    assert_eq!(active.id, b.id);
    let still_active: Vec<_> = store
        .rule_sets()
        .await
        .unwrap()
        .into_iter()
        .filter(|rs| rs.is_active)
        .collect();
    assert_eq!(still_active.len(), 1);
}

#[tokio::test]
async fn assignment_upsert_keys_on_incident_and_resource() {
    let store = MemoryStore::new();
    let incident_id = Uuid::new_v4();
    let resource_id = Uuid::new_v4();

    store
        .commit(WriteBatch::new().upsert_assignment(assignment(
            incident_id,
            resource_id,
            Some("attack"),
        )))
        .await
        .unwrap();
    store
        .commit(WriteBatch::new().upsert_assignment(assignment(
            incident_id,
            resource_id,
            Some("water-supply"),
        )))
        .await
        .unwrap();
    // A different resource on the same incident is a separate row.
    store
        .commit(WriteBatch::new().upsert_assignment(assignment(
            incident_id,
            Uuid::new_v4(),
            None,
        )))
        .await
        .unwrap();

    let assignments = store.assignments_for_incident(incident_id).await.unwrap();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].role.as_deref(), Some("water-supply"));
}

#[tokio::test]
async fn incidents_by_status_filters_and_sorts_by_creation() {
    let store = MemoryStore::new();
    let mut older = incident(IncidentStatus::Active);
    older.created_at = Utc::now() - chrono::Duration::minutes(10);
    let newer = incident(IncidentStatus::Active);
    let closed = incident(IncidentStatus::Closed);

    store.insert_incident(newer.clone()).await.unwrap();
    store.insert_incident(older.clone()).await.unwrap();
    store.insert_incident(closed).await.unwrap();

    let active = store
        .incidents_by_status(IncidentStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].id, older.id);
    assert_eq!(active[1].id, newer.id);
}

#[tokio::test]
async fn simulation_state_materialises_lazily() {
    let store = MemoryStore::new();
    let state = store.simulation_state().await.unwrap();
    assert!(!state.is_running);
    assert_eq!(state.tick_job, None);

    let mut running = state;
    running.is_running = true;
    store
        .commit(WriteBatch::new().put_simulation_state(running))
        .await
        .unwrap();
    assert!(store.simulation_state().await.unwrap().is_running);
}
