//! Per-recipient fog-of-war (§4.8): what one player currently sees.
//!
//! A building or missile the recipient doesn't own is visible only if it
//! falls inside one of the recipient's own radar rings or satellite ground
//! footprints, or (for `RevealTarget`) an active hack the recipient is
//! running has exposed it. Cities and satellites are never hidden — a
//! population center or an orbiting object isn't the kind of thing fog
//! plausibly conceals, only buildings and missiles are.

use std::collections::HashSet;

use standoff_core::constants::SATELLITE_VISION_HALF_ANGLE_DEG;
use standoff_core::entities::{Building, Satellite};
use standoff_core::enums::HackType;
use standoff_core::state::GameSession;
use standoff_core::types::GeoPos;
use standoff_geo::flight_profile;
use standoff_geo::great_circle;

use super::hacking;

/// The set of building/missile ids visible to one recipient this tick.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    pub buildings: HashSet<String>,
    pub missiles: HashSet<String>,
}

struct Sensor {
    position: GeoPos,
    range_km: f64,
}

impl Sensor {
    /// Covers a ground point (altitude 0, unaffected by horizon) or an
    /// airborne point at `altitude_m`, whose radar horizon extends the
    /// sensor's nominal range (§4.8).
    fn covers(&self, point: GeoPos, altitude_m: f64) -> bool {
        let horizon_km = great_circle::radar_horizon_km(altitude_m);
        great_circle::distance_km(self.position, point) <= self.range_km + horizon_km
    }
}

/// Whether `satellite` has a live communication path back to ground: a
/// direct link to one of `player_id`'s own active, uncompromised radars, or
/// one relay hop through another of the player's satellites that itself has
/// a direct link (§4.8, gated by `HackType::DisableSatelliteComm`).
fn satellite_has_comm_link(session: &GameSession, player_id: &str, satellite: &Satellite) -> bool {
    if hacking::is_compromised(session, &satellite.id, HackType::DisableSatelliteComm) {
        return false;
    }
    if has_direct_radar_link(session, player_id, satellite.ground_position) {
        return true;
    }
    session.satellites.values().any(|relay| {
        relay.id != satellite.id
            && relay.owner_id == player_id
            && !relay.destroyed
            && !hacking::is_compromised(session, &relay.id, HackType::DisableSatelliteComm)
            && has_direct_radar_link(session, player_id, relay.ground_position)
    })
}

fn has_direct_radar_link(session: &GameSession, player_id: &str, ground_position: GeoPos) -> bool {
    session.buildings.values().any(|b| {
        if b.owner_id() != player_id || b.destroyed() {
            return false;
        }
        let Building::Radar { common, range_km, active } = b else { return false };
        *active
            && !hacking::is_compromised(session, &common.id, HackType::BlindRadar)
            && great_circle::distance_km(common.position, ground_position) <= *range_km
    })
}

fn player_sensors(session: &GameSession, player_id: &str) -> Vec<Sensor> {
    let mut sensors = Vec::new();

    for building in session.buildings.values() {
        if building.owner_id() != player_id || building.destroyed() {
            continue;
        }
        if let Building::Radar { common, range_km, active } = building {
            if *active && !hacking::is_compromised(session, &common.id, HackType::BlindRadar) {
                sensors.push(Sensor { position: common.position, range_km: *range_km });
            }
        }
    }

    for satellite in session.satellites.values() {
        if satellite.owner_id != player_id || satellite.destroyed {
            continue;
        }
        if !satellite_has_comm_link(session, player_id, satellite) {
            continue;
        }
        let footprint_km = satellite.orbital_altitude_km * SATELLITE_VISION_HALF_ANGLE_DEG.to_radians().tan();
        sensors.push(Sensor { position: satellite.ground_position, range_km: footprint_km });
    }

    sensors
}

fn missile_altitude_m(missile: &standoff_core::entities::Missile) -> f64 {
    let common = missile.common();
    flight_profile::altitude_at_progress(common.progress, common.flight_duration_ms, common.apex_altitude_m)
}

/// Compute what `player_id` currently sees.
pub fn visible_for(session: &GameSession, player_id: &str) -> Visibility {
    let sensors = player_sensors(session, player_id);
    let mut visibility = Visibility::default();

    for building in session.buildings.values() {
        if building.destroyed() {
            continue;
        }
        if building.owner_id() == player_id {
            visibility.buildings.insert(building.id().to_string());
            continue;
        }
        let sensed = sensors.iter().any(|s| s.covers(building.common().position, 0.0));
        let revealed = hacking::compromising_attacker(session, building.id(), HackType::RevealTarget).as_deref()
            == Some(player_id);
        if sensed || revealed {
            visibility.buildings.insert(building.id().to_string());
        }
    }

    for missile in session.missiles.values() {
        if missile.owner_id() == player_id {
            visibility.missiles.insert(missile.id().to_string());
            continue;
        }
        let altitude_m = missile_altitude_m(missile);
        if sensors.iter().any(|s| s.covers(missile.common().current_geo, altitude_m)) {
            visibility.missiles.insert(missile.id().to_string());
        }
    }

    visibility
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;
    use standoff_core::entities::{BuildingCommon, Missile, MissileCommon};
    use standoff_core::enums::{MissileKind, SessionPhase};

    fn base_session() -> GameSession {
        GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase: SessionPhase::Launch,
            defcon_level: 1,
            defcon_ms_remaining: 0,
            game_speed: 1,
            players: Default::default(),
            territories: Default::default(),
            cities: Default::default(),
            buildings: Default::default(),
            missiles: Default::default(),
            satellites: Default::default(),
            hacking_nodes: Default::default(),
            hacking_connections: Default::default(),
            hacking_traces: Default::default(),
            config: SessionConfig::default(),
        }
    }

    #[test]
    fn own_buildings_are_always_visible() {
        let mut session = base_session();
        session.buildings.insert(
            "b1".into(),
            Building::Radar {
                common: BuildingCommon { id: "b1".into(), owner_id: "p1".into(), position: GeoPos::new(0.0, 0.0), destroyed: false },
                range_km: 10.0,
                active: true,
            },
        );
        let visibility = visible_for(&session, "p1");
        assert!(visibility.buildings.contains("b1"));
    }

    #[test]
    fn enemy_missile_outside_radar_range_is_hidden() {
        let mut session = base_session();
        session.buildings.insert(
            "radar-1".into(),
            Building::Radar {
                common: BuildingCommon { id: "radar-1".into(), owner_id: "p1".into(), position: GeoPos::new(0.0, 0.0), destroyed: false },
                range_km: 100.0,
                active: true,
            },
        );
        session.missiles.insert(
            "icbm-1".into(),
            Missile::Icbm {
                common: MissileCommon {
                    id: "icbm-1".into(),
                    owner_id: "p2".into(),
                    kind: MissileKind::Icbm,
                    launch_geo: GeoPos::new(0.0, 170.0),
                    target_geo: GeoPos::new(0.0, 170.0),
                    current_geo: GeoPos::new(0.0, 170.0),
                    launch_tick: 0,
                    flight_duration_ms: 10_000,
                    apex_altitude_m: 0.0,
                    progress: 0.0,
                    intercepted: false,
                    detonated: false,
                },
                source_silo_id: "other-silo".into(),
            },
        );
        let visibility = visible_for(&session, "p1");
        assert!(!visibility.missiles.contains("icbm-1"));
    }

    #[test]
    fn enemy_missile_inside_radar_range_is_visible() {
        let mut session = base_session();
        session.buildings.insert(
            "radar-1".into(),
            Building::Radar {
                common: BuildingCommon { id: "radar-1".into(), owner_id: "p1".into(), position: GeoPos::new(0.0, 0.0), destroyed: false },
                range_km: 5_000.0,
                active: true,
            },
        );
        session.missiles.insert(
            "icbm-1".into(),
            Missile::Icbm {
                common: MissileCommon {
                    id: "icbm-1".into(),
                    owner_id: "p2".into(),
                    kind: MissileKind::Icbm,
                    launch_geo: GeoPos::new(0.0, 10.0),
                    target_geo: GeoPos::new(0.0, 10.0),
                    current_geo: GeoPos::new(0.0, 10.0),
                    launch_tick: 0,
                    flight_duration_ms: 10_000,
                    apex_altitude_m: 0.0,
                    progress: 0.0,
                    intercepted: false,
                    detonated: false,
                },
                source_silo_id: "other-silo".into(),
            },
        );
        let visibility = visible_for(&session, "p1");
        assert!(visibility.missiles.contains("icbm-1"));
    }
}
