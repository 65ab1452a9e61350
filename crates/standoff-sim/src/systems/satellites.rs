//! Satellite launch, orbital ground-track advance, and interceptor-inflicted
//! damage (§4.6).
//!
//! The ground track is a simplified single-sine-wave model (inclination
//! bounds the latitude swing, longitude sweeps once per orbital period) —
//! sufficient for the fog-of-war vision cone this drives, not an orbital
//! mechanics simulation.

use standoff_core::constants::{DEFAULT_ORBITAL_ALTITUDE_KM, DEFAULT_ORBITAL_PERIOD_MS, SATELLITE_STARTING_HEALTH};
use standoff_core::entities::{Building, Satellite};
use standoff_core::enums::SessionPhase;
use standoff_core::error::CommandError;
use standoff_core::events::SimEvent;
use standoff_core::state::GameSession;
use standoff_core::types::GeoPos;

/// Handle a validated `launch_satellite` command. Legal from DEFCON 4
/// onward (placement has ended), subject to stock and cooldown (§4.6).
pub fn launch_satellite(
    session: &mut GameSession,
    player_id: &str,
    facility_id: &str,
    inclination_deg: f64,
) -> Result<SimEvent, CommandError> {
    if session.phase == SessionPhase::Placement {
        return Err(CommandError::WrongPhase);
    }

    let facility = session
        .buildings
        .get(facility_id)
        .ok_or_else(|| CommandError::UnknownEntity(facility_id.to_string()))?;
    if facility.owner_id() != player_id {
        return Err(CommandError::NotOwner(facility_id.to_string()));
    }
    if facility.destroyed() {
        return Err(CommandError::UnknownEntity(facility_id.to_string()));
    }

    let (stock, cooldown_ms, last_launch_ms, position) = match facility {
        Building::SatelliteFacility { common, satellite_stock, launch_cooldown_ms, last_launch_time_ms } => {
            (*satellite_stock, *launch_cooldown_ms, *last_launch_time_ms, common.position)
        }
        _ => return Err(CommandError::WrongSiloMode),
    };
    if stock == 0 {
        return Err(CommandError::AmmoExhausted);
    }

    let now_ms = session.clock.timestamp_ms;
    if last_launch_ms > 0 && now_ms.saturating_sub(last_launch_ms) < cooldown_ms {
        return Err(CommandError::CooldownActive);
    }

    let inclination_deg = inclination_deg.clamp(0.0, 90.0);

    if let Some(Building::SatelliteFacility { satellite_stock, last_launch_time_ms, .. }) =
        session.buildings.get_mut(facility_id)
    {
        *satellite_stock -= 1;
        *last_launch_time_ms = now_ms;
    }

    let satellite_id = format!("{player_id}-sat-{}", uuid::Uuid::new_v4());
    session.satellites.insert(
        satellite_id.clone(),
        Satellite {
            id: satellite_id.clone(),
            owner_id: player_id.to_string(),
            source_facility_id: facility_id.to_string(),
            launch_epoch_ms: now_ms,
            orbital_period_ms: DEFAULT_ORBITAL_PERIOD_MS,
            orbital_altitude_km: DEFAULT_ORBITAL_ALTITUDE_KM,
            inclination_deg,
            starting_longitude_deg: position.lon,
            destroyed: false,
            health: SATELLITE_STARTING_HEALTH,
            progress: 0.0,
            ground_position: position,
        },
    );

    Ok(SimEvent::SatelliteLaunch { satellite_id, owner_id: player_id.to_string() })
}

/// Advance every live satellite's orbital ground track to the session's
/// current timestamp.
pub fn step(session: &mut GameSession) {
    let now_ms = session.clock.timestamp_ms;
    for satellite in session.satellites.values_mut() {
        if satellite.destroyed {
            continue;
        }
        let elapsed = now_ms.saturating_sub(satellite.launch_epoch_ms);
        let progress = (elapsed % satellite.orbital_period_ms) as f64 / satellite.orbital_period_ms as f64;
        satellite.progress = progress;
        satellite.ground_position = ground_position_at(satellite, progress);
    }
}

pub(crate) fn ground_position_at(satellite: &Satellite, progress: f64) -> GeoPos {
    let angle = progress * std::f64::consts::TAU;
    let lat = satellite.inclination_deg * angle.sin();
    let lon = normalize_longitude(satellite.starting_longitude_deg + progress * 360.0);
    GeoPos::new(lat, lon)
}

fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    wrapped
}

/// Apply interceptor- or hack-inflicted damage to a satellite, destroying it
/// at zero health.
pub fn damage_satellite(session: &mut GameSession, satellite_id: &str, amount: f64, events: &mut Vec<SimEvent>) {
    let Some(satellite) = session.satellites.get_mut(satellite_id) else {
        return;
    };
    if satellite.destroyed {
        return;
    }
    satellite.health = (satellite.health - amount).max(0.0);
    if satellite.health == 0.0 {
        satellite.destroyed = true;
        events.push(SimEvent::SatelliteDestroyed { satellite_id: satellite_id.to_string() });
    }
}
