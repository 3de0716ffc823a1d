//! Bootstrap roster: a handful of Waikato stations and their appliances.
//! Coordinates are approximate; this is demo data, not an authoritative feed.

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use turnout_common::{Capability, Resource, ResourceStatus, Station};
use turnout_store::Repository;
use uuid::Uuid;

struct StationSeed {
    name: &'static str,
    lat: f64,
    lng: f64,
    appliances: &'static [(&'static str, &'static [Capability])],
}

use Capability::*;

const STATIONS: &[StationSeed] = &[
    StationSeed {
        name: "Morrinsville",
        lat: -37.65,
        lng: 175.53,
        appliances: &[
            ("MORRINSVILLE-1", &[Pump, Rescue]),
            ("MORRINSVILLE-2", &[Pump]),
            ("MORRINSVILLE-COMMAND", &[Command]),
        ],
    },
    StationSeed {
        name: "Hamilton",
        lat: -37.787,
        lng: 175.279,
        appliances: &[
            ("HAMILTON-1", &[Pump, Rescue]),
            ("HAMILTON-2", &[Pump]),
            ("HAMILTON-3", &[Pump, HazmatSupport]),
            ("HAMILTON-COMMAND", &[Command]),
        ],
    },
    StationSeed {
        name: "Te Aroha",
        lat: -37.54,
        lng: 175.71,
        appliances: &[
            ("TE-AROHA-1", &[Pump, Rescue]),
            ("TE-AROHA-2", &[Pump, WaterSupplySupport]),
        ],
    },
    StationSeed {
        name: "Cambridge",
        lat: -37.878,
        lng: 175.44,
        appliances: &[
            ("CAMBRIDGE-1", &[Pump, Rescue]),
            ("CAMBRIDGE-2", &[Pump, MedicalSupport]),
        ],
    },
];

/// Insert the demo stations and appliances. Idempotent by station name.
pub async fn seed_roster(store: &dyn Repository) -> Result<()> {
    let existing = store.stations().await?;
    if existing.iter().any(|s| s.name == "Morrinsville") {
        info!("roster already seeded");
        return Ok(());
    }

    for seed in STATIONS {
        let station = Station {
            id: Uuid::new_v4(),
            name: seed.name.to_string(),
            lat: seed.lat,
            lng: seed.lng,
            address: Some(format!("{}, Waikato", seed.name)),
        };
        store.insert_station(station.clone()).await?;
        for (call_sign, capabilities) in seed.appliances {
            store
                .insert_resource(Resource {
                    id: Uuid::new_v4(),
                    station_id: station.id,
                    call_sign: call_sign.to_string(),
                    capabilities: capabilities.to_vec(),
                    status: ResourceStatus::Available,
                    current_incident_id: None,
                    eta_minutes: None,
                    status_changed_at: Utc::now(),
                })
                .await?;
        }
    }
    info!(stations = STATIONS.len(), "roster seeded");
    Ok(())
}
