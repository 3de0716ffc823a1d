//! Capability-based rule matching.
//!
//! Exactly one rule set is active system-wide. Evaluation walks its rules in
//! priority-descending order and the first match wins; equal priorities fall
//! back to insertion order, so the ordered fetch is the only sort the engine
//! ever needs.

use std::collections::BTreeMap;

use tracing::info;
use turnout_common::{
    Capability, DispatchError, IncidentType, Recommendation, Rule, RuleCondition, RuleRecommend,
    RuleSet,
};
use turnout_store::WriteBatch;
use uuid::Uuid;

use crate::DispatchEngine;

/// A rule set as submitted for creation, before it has an identity or an
/// active flag. Validated here, not at evaluation time.
#[derive(Debug, Clone)]
pub struct RuleSetDraft {
    pub name: String,
    pub version: u32,
    pub description: Option<String>,
    pub rules: Vec<Rule>,
}

impl DispatchEngine {
    /// Match the context against the active rule set. No active set, an empty
    /// set, or no matching rule all mean "no recommendation", not an error.
    pub async fn evaluate(
        &self,
        incident_type: IncidentType,
        priority: u8,
        _people_inside_unknown: bool,
    ) -> Result<Option<Recommendation>, DispatchError> {
        let Some(active) = self.store.active_rule_set().await? else {
            return Ok(None);
        };

        for rule in active.rules_by_priority() {
            if !rule.when.matches(incident_type, priority) {
                continue;
            }
            let mut minimum_counts = BTreeMap::new();
            for cap in &rule.recommend.required_capabilities {
                let need = rule.recommend.minimum_counts.get(cap).copied().unwrap_or(1);
                minimum_counts.insert(*cap, need);
            }
            return Ok(Some(Recommendation {
                required_capabilities: rule.recommend.required_capabilities.clone(),
                minimum_counts,
                max_travel_minutes: rule.recommend.max_travel_minutes,
                explanation: format!("Matched rule: {}", rule.name),
                rule_name: rule.name.clone(),
            }));
        }
        Ok(None)
    }

    /// Validate and store a new rule set. It is created inactive.
    pub async fn create_rule_set(&self, draft: RuleSetDraft) -> Result<RuleSet, DispatchError> {
        validate_draft(&draft)?;
        let rule_set = RuleSet {
            id: Uuid::new_v4(),
            name: draft.name,
            version: draft.version,
            is_active: false,
            description: draft.description,
            rules: draft.rules,
        };
        self.store.insert_rule_set(rule_set.clone()).await?;
        info!(name = rule_set.name.as_str(), rules = rule_set.rules.len(), "rule set created");
        Ok(rule_set)
    }

    /// Make this the single active rule set. Clearing every other active flag
    /// and setting this one is a single atomic batch, so no observer ever
    /// sees two active sets.
    pub async fn activate_rule_set(&self, id: Uuid) -> Result<RuleSet, DispatchError> {
        if self.store.rule_set(id).await?.is_none() {
            return Err(DispatchError::NotFound(format!("rule set {id}")));
        }
        self.store
            .commit(WriteBatch::new().activate_rule_set(id))
            .await?;
        let activated = self
            .store
            .rule_set(id)
            .await?
            .ok_or_else(|| DispatchError::NotFound(format!("rule set {id}")))?;
        info!(name = activated.name.as_str(), "rule set activated");
        Ok(activated)
    }

    /// Install and activate the stock rule set if it is not already present.
    pub async fn seed_default_rules(&self) -> Result<RuleSet, DispatchError> {
        if let Some(existing) = self
            .store
            .rule_sets()
            .await?
            .into_iter()
            .find(|rs| rs.name == "default-v1")
        {
            return Ok(existing);
        }
        let created = self.create_rule_set(default_rule_set()).await?;
        self.activate_rule_set(created.id).await
    }
}

fn validate_draft(draft: &RuleSetDraft) -> Result<(), DispatchError> {
    if draft.name.trim().is_empty() {
        return Err(DispatchError::Validation("rule set name is empty".into()));
    }
    for rule in &draft.rules {
        if rule.name.trim().is_empty() {
            return Err(DispatchError::Validation("rule name is empty".into()));
        }
        if let Some(priorities) = &rule.when.priorities {
            if let Some(p) = priorities.iter().find(|p| !(1..=5).contains(*p)) {
                return Err(DispatchError::Validation(format!(
                    "rule '{}': priority {p} outside 1-5",
                    rule.name
                )));
            }
        }
        if rule.recommend.required_capabilities.is_empty() {
            return Err(DispatchError::Validation(format!(
                "rule '{}': no required capabilities",
                rule.name
            )));
        }
        for (cap, count) in &rule.recommend.minimum_counts {
            if !rule.recommend.required_capabilities.contains(cap) {
                return Err(DispatchError::Validation(format!(
                    "rule '{}': minimum count for unlisted capability",
                    rule.name
                )));
            }
            if *count == 0 {
                return Err(DispatchError::Validation(format!(
                    "rule '{}': minimum count of zero",
                    rule.name
                )));
            }
        }
    }
    Ok(())
}

/// The stock capability rules shipped with the simulator.
fn default_rule_set() -> RuleSetDraft {
    fn rule(
        name: &str,
        priority: i32,
        when: RuleCondition,
        caps: &[Capability],
        counts: &[(Capability, u32)],
        max_travel: Option<u32>,
    ) -> Rule {
        Rule {
            name: name.to_string(),
            priority,
            when,
            recommend: RuleRecommend {
                required_capabilities: caps.to_vec(),
                minimum_counts: counts.iter().copied().collect(),
                max_travel_minutes: max_travel,
            },
        }
    }

    use Capability::*;
    use IncidentType::*;

    let typed = |t: IncidentType| RuleCondition {
        incident_types: Some(vec![t]),
        priorities: None,
    };

    RuleSetDraft {
        name: "default-v1".into(),
        version: 1,
        description: Some("Default capability-based dispatch rules".into()),
        rules: vec![
            rule(
                "house-fire-priority-1-2",
                100,
                RuleCondition {
                    incident_types: Some(vec![HouseFire]),
                    priorities: Some(vec![1, 2]),
                },
                &[Pump, Rescue, Command],
                &[(Pump, 2), (Rescue, 1), (Command, 1)],
                Some(15),
            ),
            rule(
                "house-fire-default",
                50,
                typed(HouseFire),
                &[Pump, Rescue],
                &[(Pump, 1), (Rescue, 1)],
                Some(20),
            ),
            rule(
                "vehicle-crash",
                60,
                typed(VehicleCrash),
                &[Rescue, Pump, MedicalSupport],
                &[(Rescue, 1), (Pump, 1)],
                Some(15),
            ),
            rule(
                "vegetation-fire",
                55,
                typed(VegetationFire),
                &[Pump, WaterSupplySupport],
                &[(Pump, 2)],
                Some(25),
            ),
            rule(
                "hazmat-suspected",
                90,
                typed(HazmatSuspected),
                &[HazmatSupport, Command, Pump],
                &[(HazmatSupport, 1), (Command, 1)],
                Some(20),
            ),
            rule(
                "alarm-activation",
                30,
                typed(AlarmActivation),
                &[Pump],
                &[(Pump, 1)],
                Some(10),
            ),
            rule(
                "medical-assist",
                70,
                typed(MedicalAssist),
                &[MedicalSupport, Rescue],
                &[(MedicalSupport, 1)],
                Some(12),
            ),
            rule(
                "fallback",
                1,
                RuleCondition::default(),
                &[Pump],
                &[(Pump, 1)],
                Some(25),
            ),
        ],
    }
}
