//! ICBM detonation: population loss, building destruction, and score
//! attribution (§4.6).
//!
//! Grounded on `deterrence-sim::systems::damage` (teacher's own detonation
//! step: radius-falloff population loss, score hooks) generalized to this
//! sim's `City`/`Territory`/`Player` split instead of a single health pool.

use standoff_core::constants::{BLAST_RADIUS_KM, DAMAGE_COEFFICIENT, SCORE_PER_BUILDING_DESTROYED, SCORE_PER_KILL};
use standoff_core::entities::Missile;
use standoff_core::events::SimEvent;
use standoff_core::state::GameSession;
use standoff_geo::great_circle;

/// Resolve an ICBM detonating at its current position: damage every city
/// within `BLAST_RADIUS_KM`, destroy co-located buildings, and attribute
/// population loss / score to the relevant players.
pub fn detonate_icbm(session: &mut GameSession, icbm_id: &str, events: &mut Vec<SimEvent>) {
    let Some(Missile::Icbm { common, .. }) = session.missiles.get(icbm_id).cloned() else {
        return;
    };
    let ground_zero = common.current_geo;
    let attacker_id = common.owner_id;

    damage_cities(session, ground_zero, &attacker_id, events);
    damage_buildings(session, ground_zero, &attacker_id, events);
}

fn damage_cities(session: &mut GameSession, ground_zero: standoff_core::types::GeoPos, attacker_id: &str, events: &mut Vec<SimEvent>) {
    let city_ids: Vec<String> = session.cities.keys().cloned().collect();
    for city_id in city_ids {
        let Some(city) = session.cities.get(&city_id) else {
            continue;
        };
        if city.destroyed {
            continue;
        }
        let distance_km = great_circle::distance_km(ground_zero, city.geo_position);
        if distance_km >= BLAST_RADIUS_KM {
            continue;
        }

        let falloff = 1.0 - distance_km / BLAST_RADIUS_KM;
        let loss = (city.population as f64 * falloff * DAMAGE_COEFFICIENT) as u64;
        if loss == 0 {
            continue;
        }

        let (actual, territory_id) = {
            let city = session.cities.get_mut(&city_id).expect("checked above");
            (city.apply_losses(loss), city.territory_id.clone())
        };
        if actual == 0 {
            continue;
        }

        events.push(SimEvent::CityHit {
            city_id: city_id.clone(),
            population_lost: actual,
            attacker_id: attacker_id.to_string(),
        });

        let defender_id = session.territories.get(&territory_id).and_then(|t| t.owner_id.clone());
        if let Some(defender_id) = defender_id {
            if let Some(defender) = session.players.get_mut(&defender_id) {
                defender.population_lost += actual;
                defender.population_remaining = defender.population_remaining.saturating_sub(actual);
            }
        }
        if let Some(attacker) = session.players.get_mut(attacker_id) {
            attacker.score += actual as i64 * SCORE_PER_KILL;
            attacker.enemy_kills = attacker.enemy_kills.saturating_add(actual.min(u32::MAX as u64) as u32);
        }
    }
}

fn damage_buildings(session: &mut GameSession, ground_zero: standoff_core::types::GeoPos, attacker_id: &str, events: &mut Vec<SimEvent>) {
    let building_ids: Vec<String> = session.buildings.keys().cloned().collect();
    for building_id in building_ids {
        let Some(building) = session.buildings.get(&building_id) else {
            continue;
        };
        if building.destroyed() {
            continue;
        }
        let distance_km = great_circle::distance_km(ground_zero, building.common().position);
        if distance_km >= BLAST_RADIUS_KM {
            continue;
        }

        let owner_id = building.owner_id().to_string();
        if let Some(building) = session.buildings.get_mut(&building_id) {
            building.common_mut().destroyed = true;
        }
        events.push(SimEvent::BuildingDestroyed {
            building_id: building_id.clone(),
            owner_id,
        });
        if let Some(attacker) = session.players.get_mut(attacker_id) {
            attacker.score += SCORE_PER_BUILDING_DESTROYED;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;
    use standoff_core::entities::{BuildingCommon, City, MissileCommon, Player, Territory};
    use standoff_core::enums::MissileKind;
    use standoff_core::types::GeoPos;

    fn base_session() -> GameSession {
        GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase: standoff_core::enums::SessionPhase::Launch,
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
    fn detonation_damages_nearby_city_and_scores_attacker() {
        let mut session = base_session();
        session.players.insert("attacker".into(), Player::new("attacker", "A", false));
        session.players.insert("defender".into(), Player::new("defender", "D", false));
        session.players.get_mut("defender").unwrap().population_remaining = 1_000_000;

        session.territories.insert(
            "t1".into(),
            Territory {
                id: "t1".into(),
                name: "T1".into(),
                boundary_polygon: vec![],
                city_ids: vec!["c1".into()],
                starting_positions: vec![],
                owner_id: Some("defender".into()),
            },
        );
        session.cities.insert(
            "c1".into(),
            City {
                id: "c1".into(),
                territory_id: "t1".into(),
                geo_position: GeoPos::new(0.0, 0.0),
                population: 1_000_000,
                max_population: 1_000_000,
                destroyed: false,
            },
        );
        session.missiles.insert(
            "icbm-1".into(),
            Missile::Icbm {
                common: MissileCommon {
                    id: "icbm-1".into(),
                    owner_id: "attacker".into(),
                    kind: MissileKind::Icbm,
                    launch_geo: GeoPos::new(0.0, 0.0),
                    target_geo: GeoPos::new(0.0, 0.0),
                    current_geo: GeoPos::new(0.0, 0.0),
                    launch_tick: 0,
                    flight_duration_ms: 10_000,
                    apex_altitude_m: 0.0,
                    progress: 1.0,
                    intercepted: false,
                    detonated: true,
                },
                source_silo_id: "silo-1".into(),
            },
        );

        let mut events = Vec::new();
        detonate_icbm(&mut session, "icbm-1", &mut events);

        let city = &session.cities["c1"];
        assert!(city.population < 1_000_000);
        assert!(session.players["attacker"].score > 0);
        assert!(session.players["defender"].population_lost > 0);
        assert!(events.iter().any(|e| matches!(e, SimEvent::CityHit { .. })));
    }

    #[test]
    fn detonation_destroys_colocated_building() {
        let mut session = base_session();
        session.players.insert("attacker".into(), Player::new("attacker", "A", false));
        session.buildings.insert(
            "b1".into(),
            standoff_core::entities::Building::Radar {
                common: BuildingCommon {
                    id: "b1".into(),
                    owner_id: "defender".into(),
                    position: GeoPos::new(0.0, 0.0),
                    destroyed: false,
                },
                range_km: 100.0,
                active: true,
            },
        );
        session.missiles.insert(
            "icbm-1".into(),
            Missile::Icbm {
                common: MissileCommon {
                    id: "icbm-1".into(),
                    owner_id: "attacker".into(),
                    kind: MissileKind::Icbm,
                    launch_geo: GeoPos::new(0.0, 0.0),
                    target_geo: GeoPos::new(0.0, 0.0),
                    current_geo: GeoPos::new(0.0, 0.0),
                    launch_tick: 0,
                    flight_duration_ms: 10_000,
                    apex_altitude_m: 0.0,
                    progress: 1.0,
                    intercepted: false,
                    detonated: true,
                },
                source_silo_id: "silo-1".into(),
            },
        );

        let mut events = Vec::new();
        detonate_icbm(&mut session, "icbm-1", &mut events);

        assert!(session.buildings["b1"].destroyed());
        assert!(events.iter().any(|e| matches!(e, SimEvent::BuildingDestroyed { .. })));
    }
}
