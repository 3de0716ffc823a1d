//! Headless end-to-end run: seed a roster and the stock rules, raise a house
//! fire, dispatch the recommendation, let the simulator grind the severity
//! down, then close and print the after-action review.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use turnout_common::{Capability, Config, IncidentType, ResourceStatus};
use turnout_engine::{build_engine, AssignmentRequest, NewIncident};
use turnout_events::{MemoryEventLog, NoopSink};
use turnout_store::{MemoryStore, Repository};

mod seed;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("turnout=info".parse()?))
        .init();

    let config = Config::from_env();
    info!(tick_ms = config.tick_interval_ms, "turnout simulator starting");

    let store: Arc<dyn Repository> = Arc::new(MemoryStore::new());
    let log = Arc::new(MemoryEventLog::new());
    let engine = build_engine(store.clone(), log.clone(), Arc::new(NoopSink), config.clone());

    seed::seed_roster(store.as_ref()).await?;
    let rules = engine.seed_default_rules().await?;
    info!(rule_set = rules.name.as_str(), "rules active");

    // A serious house fire just outside Morrinsville.
    let incident = engine
        .create_incident(NewIncident {
            incident_type: IncidentType::HouseFire,
            priority: 1,
            lat: -37.66,
            lng: 175.54,
            label: Some("14 Thames St".into()),
            people_inside_unknown: true,
            severity: Some(60),
        })
        .await?;

    let detail = engine.incident_detail(incident.id).await?;
    if let Some(rec) = &detail.recommended {
        info!(rule = rec.rule_name.as_str(), "recommendation: {:?}", rec.minimum_counts);
    }

    // Pick available appliances to cover the recommended capabilities.
    let requests = select_units(&store, detail.recommended.as_ref()).await?;
    info!(units = requests.len(), "dispatching");
    engine.dispatch(incident.id, &requests).await?;

    engine.start().await?;

    // Let travel finish and the tick run the incident down. Demo clock only;
    // real deployments drive this from their own lifecycle.
    for _ in 0..60 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let current = engine.incident_detail(incident.id).await?;
        info!(
            status = ?current.incident.status,
            severity = current.incident.severity,
            "incident update"
        );
        if current.incident.status == turnout_common::IncidentStatus::Contained {
            break;
        }
    }

    engine.stop().await?;
    engine.close(incident.id).await?;

    let report = engine.aar(incident.id).await?;
    info!(
        overall = report.scores.overall,
        appropriateness = report.scores.appropriateness,
        efficiency = report.scores.efficiency,
        response = report.scores.response_time,
        outcome = report.scores.outcome,
        "after-action review"
    );
    println!("{}", report.narrative);

    Ok(())
}

/// Greedy cover: walk the recommendation's minimum counts and grab available
/// appliances that carry each capability.
async fn select_units(
    store: &Arc<dyn Repository>,
    recommended: Option<&turnout_common::Recommendation>,
) -> Result<Vec<AssignmentRequest>> {
    let mut requests: Vec<AssignmentRequest> = Vec::new();
    let Some(rec) = recommended else {
        return Ok(requests);
    };
    let resources = store.resources().await?;
    for (cap, need) in &rec.minimum_counts {
        let mut picked = 0u32;
        for resource in &resources {
            if picked >= *need {
                break;
            }
            if resource.status != ResourceStatus::Available {
                continue;
            }
            if !resource.capabilities.contains(cap) {
                continue;
            }
            if requests.iter().any(|r| r.resource_id == resource.id) {
                continue;
            }
            requests.push(AssignmentRequest {
                resource_id: resource.id,
                role: Some(role_for(*cap).to_string()),
            });
            picked += 1;
        }
    }
    Ok(requests)
}

fn role_for(cap: Capability) -> &'static str {
    match cap {
        Capability::Pump => "attack",
        Capability::Rescue => "rescue",
        Capability::Command => "command",
        Capability::WaterSupplySupport => "water-supply",
        Capability::HazmatSupport => "hazmat",
        Capability::MedicalSupport => "medical",
    }
}
