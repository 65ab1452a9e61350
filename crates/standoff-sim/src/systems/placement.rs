//! Building placement command handler (§4.3 step 3 "placement (if DEFCON 5)",
//! §3 capacity caps).

use standoff_core::commands::PlaceableBuildingType;
use standoff_core::constants::{
    MAX_AIRFIELDS_PER_PLAYER, MAX_RADARS_PER_PLAYER, MAX_SATELLITE_FACILITIES_PER_PLAYER,
    SATELLITE_LAUNCH_COOLDOWN_MS,
};
use standoff_core::entities::{Building, BuildingCommon};
use standoff_core::enums::SessionPhase;
use standoff_core::error::CommandError;
use standoff_core::state::GameSession;
use standoff_core::types::GeoPos;

fn owned_count(session: &GameSession, player_id: &str, matches: impl Fn(&Building) -> bool) -> u32 {
    session
        .buildings
        .values()
        .filter(|b| b.owner_id() == player_id && !b.destroyed() && matches(b))
        .count() as u32
}

/// Handle a validated `place_building` command. Only legal at DEFCON 5.
pub fn place_building(
    session: &mut GameSession,
    player_id: &str,
    building_type: PlaceableBuildingType,
    position: GeoPos,
) -> Result<String, CommandError> {
    if session.phase != SessionPhase::Placement {
        return Err(CommandError::WrongPhase);
    }

    let cap = match building_type {
        PlaceableBuildingType::Silo => session.config.max_silos_per_player,
        PlaceableBuildingType::Radar => MAX_RADARS_PER_PLAYER,
        PlaceableBuildingType::Airfield => MAX_AIRFIELDS_PER_PLAYER,
        PlaceableBuildingType::SatelliteFacility => MAX_SATELLITE_FACILITIES_PER_PLAYER,
    };
    let current = owned_count(session, player_id, |b| {
        matches!(
            (b, building_type),
            (Building::Silo { .. }, PlaceableBuildingType::Silo)
                | (Building::Radar { .. }, PlaceableBuildingType::Radar)
                | (Building::Airfield { .. }, PlaceableBuildingType::Airfield)
                | (
                    Building::SatelliteFacility { .. },
                    PlaceableBuildingType::SatelliteFacility
                )
        )
    });
    if current >= cap {
        return Err(CommandError::CapacityReached);
    }

    let id = format!("{player_id}-{}", uuid::Uuid::new_v4());
    let common = BuildingCommon {
        id: id.clone(),
        owner_id: player_id.to_string(),
        position,
        destroyed: false,
    };

    let building = match building_type {
        PlaceableBuildingType::Silo => Building::Silo {
            common,
            mode: standoff_core::enums::SiloMode::Defend,
            missile_ammo: session.config.starting_missile_ammo,
            interceptor_ammo: session.config.starting_interceptor_ammo,
            last_fire_time_ms: 0,
        },
        PlaceableBuildingType::Radar => Building::Radar {
            common,
            range_km: standoff_core::constants::DEFAULT_RADAR_RANGE_KM,
            active: true,
        },
        PlaceableBuildingType::Airfield => Building::Airfield {
            common,
            fighter_ammo: 4,
            bomber_ammo: 2,
        },
        PlaceableBuildingType::SatelliteFacility => Building::SatelliteFacility {
            common,
            satellite_stock: 2,
            launch_cooldown_ms: SATELLITE_LAUNCH_COOLDOWN_MS,
            last_launch_time_ms: 0,
        },
    };

    session.buildings.insert(id.clone(), building);
    Ok(id)
}
