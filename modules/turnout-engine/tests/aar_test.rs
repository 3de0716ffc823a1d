//! After-action scoring: preconditions, formulas, timings, narrative.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::{harness, seed_incident, seed_resource, seed_station, Harness};
use turnout_common::{
    Capability, DispatchError, IncidentStatus, Rule, RuleCondition, RuleRecommend,
};
use turnout_engine::{AssignmentRequest, RuleSetDraft};
use turnout_events::{EntityKind, EventKind, EventLogEntry};
use uuid::Uuid;

fn timeline_entry(kind: EventKind, incident_id: Uuid, at: DateTime<Utc>) -> EventLogEntry {
    EventLogEntry {
        id: Uuid::new_v4(),
        kind,
        entity_kind: EntityKind::Incident,
        entity_id: incident_id,
        payload: serde_json::json!({}),
        incident_id: Some(incident_id),
        created_at: at,
    }
}

/// Activates a single always-matching rule with the given requirements.
async fn activate_rule(
    h: &Harness,
    required: Vec<Capability>,
    minimum_counts: &[(Capability, u32)],
) {
    let set = h
        .engine
        .create_rule_set(RuleSetDraft {
            name: "aar-fixture".into(),
            version: 1,
            description: None,
            rules: vec![Rule {
                name: "fixture".into(),
                priority: 1,
                when: RuleCondition::default(),
                recommend: RuleRecommend {
                    required_capabilities: required,
                    minimum_counts: minimum_counts.iter().copied().collect(),
                    max_travel_minutes: None,
                },
            }],
        })
        .await
        .unwrap();
    h.engine.activate_rule_set(set.id).await.unwrap();
}

#[tokio::test]
async fn aar_is_only_available_for_closed_incidents() {
    let h = harness();
    let incident = seed_incident(&h.store, IncidentStatus::Active, 50).await;

    let err = h.engine.aar(incident.id).await.unwrap_err();
    assert!(matches!(err, DispatchError::PreconditionFailed(_)));

    let err = h.engine.aar(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DispatchError::NotFound(_)));
}

#[tokio::test]
async fn well_run_incident_scores_high_across_the_board() {
    let h = harness();
    activate_rule(&h, vec![Capability::Pump], &[]).await;

    let station = seed_station(&h.store, -37.65, 175.53).await;
    let truck = seed_resource(&h.store, station.id, "MORRINSVILLE-1", &[Capability::Pump]).await;
    let incident = seed_incident(&h.store, IncidentStatus::New, 9).await;

    h.engine
        .dispatch(
            incident.id,
            &[AssignmentRequest {
                resource_id: truck.id,
                role: None,
            }],
        )
        .await
        .unwrap();

    h.log.insert(timeline_entry(
        EventKind::ResourceOnScene,
        incident.id,
        incident.created_at + Duration::minutes(5),
    ));
    h.log.insert(timeline_entry(
        EventKind::IncidentContained,
        incident.id,
        incident.created_at + Duration::minutes(20),
    ));
    h.engine.close(incident.id).await.unwrap();

    let report = h.engine.aar(incident.id).await.unwrap();
    assert_eq!(report.scores.appropriateness, 100);
    assert_eq!(report.scores.efficiency, 100);
    // 100 minus 5 elapsed minutes.
    assert_eq!(report.scores.response_time, 95);
    // (100 - 9) * 0.5 + (50 - 20 * 0.5) = 85.5, rounded.
    assert_eq!(report.scores.outcome, 86);
    // 100*0.3 + 100*0.2 + 95*0.2 + 85.5*0.3 = 94.65, rounded.
    assert_eq!(report.scores.overall, 95);

    assert_eq!(
        report.timings.first_unit_on_scene,
        Some(incident.created_at + Duration::minutes(5))
    );
    assert_eq!(report.timings.time_to_containment_minutes, Some(20));
    assert!(report.timings.closed_at.is_some());
}

#[tokio::test]
async fn under_dispatch_costs_fifteen_per_missing_unit() {
    let h = harness();
    activate_rule(
        &h,
        vec![Capability::Pump, Capability::Rescue],
        &[(Capability::Pump, 2)],
    )
    .await;

    let station = seed_station(&h.store, -37.65, 175.53).await;
    let truck = seed_resource(&h.store, station.id, "MORRINSVILLE-1", &[Capability::Pump]).await;
    let incident = seed_incident(&h.store, IncidentStatus::New, 50).await;
    h.engine
        .dispatch(
            incident.id,
            &[AssignmentRequest {
                resource_id: truck.id,
                role: None,
            }],
        )
        .await
        .unwrap();
    h.engine.close(incident.id).await.unwrap();

    let report = h.engine.aar(incident.id).await.unwrap();
    // One pump short of two (-15) and the rescue entirely absent (-15).
    assert_eq!(report.scores.appropriateness, 70);
    // One unit sent against three recommended.
    assert_eq!(report.scores.efficiency, 85);
}

#[tokio::test]
async fn over_dispatch_penalises_appropriateness_and_efficiency() {
    let h = harness();
    activate_rule(&h, vec![Capability::Pump], &[]).await;

    let station = seed_station(&h.store, -37.65, 175.53).await;
    let incident = seed_incident(&h.store, IncidentStatus::New, 50).await;
    let mut requests = Vec::new();
    for n in 1..=4 {
        let truck = seed_resource(
            &h.store,
            station.id,
            &format!("MORRINSVILLE-{n}"),
            &[Capability::Pump],
        )
        .await;
        requests.push(AssignmentRequest {
            resource_id: truck.id,
            role: None,
        });
    }
    h.engine.dispatch(incident.id, &requests).await.unwrap();
    h.engine.close(incident.id).await.unwrap();

    let report = h.engine.aar(incident.id).await.unwrap();
    // Four pumps against one needed: well past need + 1.
    assert_eq!(report.scores.appropriateness, 95);
    // Four sent, one recommended: one unit beyond the +2 allowance.
    assert_eq!(report.scores.efficiency, 90);
    assert_eq!(report.sent.len(), 4);
}

#[tokio::test]
async fn missing_timeline_falls_back_to_neutral_scores() {
    let h = harness();
    // No rules, nothing dispatched, never on scene or contained.
    let incident = seed_incident(&h.store, IncidentStatus::New, 50).await;
    h.engine.close(incident.id).await.unwrap();

    let report = h.engine.aar(incident.id).await.unwrap();
    assert!(report.recommended.is_none());
    assert_eq!(report.scores.response_time, 50);
    // (100 - 50) * 0.5 + 25 for the missing containment time.
    assert_eq!(report.scores.outcome, 50);
    assert_eq!(report.timings.first_unit_on_scene, None);
    assert_eq!(report.timings.time_to_containment_minutes, None);
}

#[tokio::test]
async fn scoring_baseline_is_the_rule_set_active_now() {
    let h = harness();
    activate_rule(&h, vec![Capability::Pump], &[]).await;

    let station = seed_station(&h.store, -37.65, 175.53).await;
    let truck = seed_resource(&h.store, station.id, "MORRINSVILLE-1", &[Capability::Pump]).await;
    let incident = seed_incident(&h.store, IncidentStatus::New, 50).await;
    h.engine
        .dispatch(
            incident.id,
            &[AssignmentRequest {
                resource_id: truck.id,
                role: None,
            }],
        )
        .await
        .unwrap();
    h.engine.close(incident.id).await.unwrap();

    // Swap the active rules after the fact; the review rescores against them.
    activate_rule(&h, vec![Capability::Pump], &[(Capability::Pump, 2)]).await;

    let report = h.engine.aar(incident.id).await.unwrap();
    assert_eq!(report.scores.appropriateness, 85);
}

#[tokio::test]
async fn narrative_summarises_the_timeline() {
    let h = harness();
    activate_rule(&h, vec![Capability::Pump], &[]).await;

    let station = seed_station(&h.store, -37.65, 175.53).await;
    let truck = seed_resource(&h.store, station.id, "MORRINSVILLE-1", &[Capability::Pump]).await;
    let incident = seed_incident(&h.store, IncidentStatus::New, 9).await;
    h.engine
        .dispatch(
            incident.id,
            &[AssignmentRequest {
                resource_id: truck.id,
                role: None,
            }],
        )
        .await
        .unwrap();
    h.log.insert(timeline_entry(
        EventKind::ResourceOnScene,
        incident.id,
        incident.created_at + Duration::minutes(5),
    ));
    h.log.insert(timeline_entry(
        EventKind::IncidentContained,
        incident.id,
        incident.created_at + Duration::minutes(20),
    ));
    h.engine.close(incident.id).await.unwrap();

    let report = h.engine.aar(incident.id).await.unwrap();
    assert!(report.narrative.starts_with("Incident type: HOUSE_FIRE."));
    assert!(report.narrative.contains("Matched rule: fixture"));
    assert!(report.narrative.contains("Dispatched 1 unit(s): MORRINSVILLE-1."));
    assert!(report
        .narrative
        .contains("First unit on scene at 5 minute(s) from call."));
    assert!(report.narrative.contains("Contained at 20 minute(s)."));
    assert!(report.narrative.ends_with("Final severity: 9/100."));
}
