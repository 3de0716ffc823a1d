//! After-action review for closed incidents.
//!
//! Timings are reconstructed from the ordered event log; nothing else is
//! trusted. The recommendation baseline is re-evaluated against the rule set
//! active *now*, not the one active when the incident was created.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use turnout_common::{Capability, DispatchError, IncidentStatus, IncidentType, Recommendation};
use turnout_events::EventKind;
use uuid::Uuid;

use crate::DispatchEngine;

#[derive(Debug, Clone, Serialize)]
pub struct SentUnit {
    pub resource_id: Uuid,
    pub call_sign: String,
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AarTimings {
    pub first_unit_on_scene: Option<DateTime<Utc>>,
    pub time_to_containment_minutes: Option<i64>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AarScores {
    pub response_time: i32,
    pub appropriateness: i32,
    pub efficiency: i32,
    pub outcome: i32,
    pub overall: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AfterActionReport {
    pub incident_id: Uuid,
    pub incident_type: IncidentType,
    /// The baseline the scoring used; `None` when no rule matched.
    pub recommended: Option<Recommendation>,
    pub sent: Vec<SentUnit>,
    pub timings: AarTimings,
    pub scores: AarScores,
    pub narrative: String,
}

impl DispatchEngine {
    /// Score a closed incident. Any other status is a precondition failure.
    pub async fn aar(&self, incident_id: Uuid) -> Result<AfterActionReport, DispatchError> {
        let incident = self
            .store
            .incident(incident_id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("incident {incident_id}")))?;
        if incident.status != IncidentStatus::Closed {
            return Err(DispatchError::PreconditionFailed(
                "after-action review is only available for closed incidents".into(),
            ));
        }

        let recommended = self
            .evaluate(
                incident.incident_type,
                incident.priority,
                incident.people_inside_unknown,
            )
            .await?;

        let mut sent = Vec::new();
        for assignment in self.store.assignments_for_incident(incident_id).await? {
            if let Some(resource) = self.store.resource(assignment.resource_id).await? {
                sent.push(SentUnit {
                    resource_id: resource.id,
                    call_sign: resource.call_sign,
                    capabilities: resource.capabilities,
                });
            }
        }

        // Walk the incident's timeline, oldest first.
        let mut first_on_scene: Option<DateTime<Utc>> = None;
        let mut contained_at: Option<DateTime<Utc>> = None;
        for entry in self.recorder.log().for_incident(incident_id).await? {
            match entry.kind {
                EventKind::ResourceOnScene if first_on_scene.is_none() => {
                    first_on_scene = Some(entry.created_at);
                }
                EventKind::IncidentContained => contained_at = Some(entry.created_at),
                _ => {}
            }
        }

        let response_ms =
            first_on_scene.map(|t| (t - incident.created_at).num_milliseconds().max(0));
        let containment_ms =
            contained_at.map(|t| (t - incident.created_at).num_milliseconds().max(0));

        let scores = score(&recommended, &sent, response_ms, containment_ms, incident.severity);
        let narrative = narrative(
            incident.incident_type,
            incident.severity,
            &sent,
            recommended.as_ref(),
            response_ms,
            containment_ms,
        );

        Ok(AfterActionReport {
            incident_id,
            incident_type: incident.incident_type,
            recommended,
            sent,
            timings: AarTimings {
                first_unit_on_scene: first_on_scene,
                time_to_containment_minutes: containment_ms.map(minutes_rounded),
                closed_at: incident.closed_at,
            },
            scores,
            narrative,
        })
    }
}

fn score(
    recommended: &Option<Recommendation>,
    sent: &[SentUnit],
    response_ms: Option<i64>,
    containment_ms: Option<i64>,
    final_severity: i32,
) -> AarScores {
    let rec_caps: &[Capability] = recommended
        .as_ref()
        .map(|r| r.required_capabilities.as_slice())
        .unwrap_or(&[]);

    let mut sent_counts: HashMap<Capability, i32> = HashMap::new();
    for unit in sent {
        for cap in &unit.capabilities {
            *sent_counts.entry(*cap).or_insert(0) += 1;
        }
    }

    // Under-dispatch costs 15 per missing unit of each capability; mild
    // over-dispatch (more than need + 1) costs a flat 5 per capability.
    let mut appropriateness: i32 = 100;
    for cap in rec_caps {
        let need = recommended
            .as_ref()
            .and_then(|r| r.minimum_counts.get(cap).copied())
            .unwrap_or(1) as i32;
        let have = sent_counts.get(cap).copied().unwrap_or(0);
        if have < need {
            appropriateness -= (need - have) * 15;
        }
        if have > need + 1 {
            appropriateness -= 5;
        }
    }
    let appropriateness = appropriateness.clamp(0, 100);

    let total_sent = sent.len() as i32;
    let total_recommended = recommended
        .as_ref()
        .map(|r| r.total_recommended() as i32)
        .unwrap_or(0);
    let mut efficiency: i32 = 100;
    if total_sent > total_recommended + 2 {
        efficiency -= (total_sent - total_recommended - 2) * 10;
    }
    if total_sent < total_recommended - 1 {
        efficiency -= 15;
    }
    let efficiency = efficiency.clamp(0, 100);

    let response_time = match response_ms {
        Some(ms) => (100 - whole_minutes(ms)).max(0) as i32,
        None => 50,
    };

    let containment_term = match containment_ms {
        Some(ms) => (50.0 - whole_minutes(ms) as f64 * 0.5).max(0.0),
        None => 25.0,
    };
    let outcome = (100 - final_severity) as f64 * 0.5 + containment_term;

    let overall = (appropriateness as f64 * 0.3
        + efficiency as f64 * 0.2
        + response_time as f64 * 0.2
        + outcome * 0.3)
        .round() as i32;

    AarScores {
        response_time,
        appropriateness,
        efficiency,
        outcome: outcome.round() as i32,
        overall: overall.clamp(0, 100),
    }
}

fn narrative(
    incident_type: IncidentType,
    final_severity: i32,
    sent: &[SentUnit],
    recommended: Option<&Recommendation>,
    response_ms: Option<i64>,
    containment_ms: Option<i64>,
) -> String {
    let mut parts = Vec::new();
    parts.push(format!(
        "Incident type: {incident_type}. Recommended: {}.",
        recommended.map(|r| r.explanation.as_str()).unwrap_or("N/A")
    ));
    let call_signs: Vec<&str> = sent.iter().map(|u| u.call_sign.as_str()).collect();
    parts.push(format!(
        "Dispatched {} unit(s): {}.",
        sent.len(),
        call_signs.join(", ")
    ));
    if let Some(ms) = response_ms {
        parts.push(format!(
            "First unit on scene at {} minute(s) from call.",
            minutes_rounded(ms)
        ));
    }
    if let Some(ms) = containment_ms {
        parts.push(format!("Contained at {} minute(s).", minutes_rounded(ms)));
    }
    parts.push(format!("Final severity: {final_severity}/100."));
    parts.join(" ")
}

/// Full elapsed minutes, truncated.
fn whole_minutes(ms: i64) -> i64 {
    ms / 60_000
}

/// Minutes rounded to nearest, for human-facing strings.
fn minutes_rounded(ms: i64) -> i64 {
    (ms as f64 / 60_000.0).round() as i64
}
