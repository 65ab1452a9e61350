//! Scripted AI opponent (§4.9): placement at DEFCON 5, mode flips at DEFCON
//! ≤ 3, jittered population-weighted salvos at DEFCON 1.
//!
//! Mutates the session directly rather than going through the command
//! queue — the AI is trusted, unlike client commands, so it skips the
//! authorization checks `standoff-sim`'s command handlers apply.

use std::collections::HashMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use standoff_catalog::Catalog;
use standoff_core::constants::{AI_SALVO_INTERVAL_MAX_MS, AI_SALVO_INTERVAL_MIN_MS, AI_TOP_CITY_TARGETS};
use standoff_core::entities::{Building, BuildingCommon, Missile, MissileCommon};
use standoff_core::enums::{MissileKind, SessionPhase, SiloMode};
use standoff_core::events::SimEvent;
use standoff_core::state::GameSession;

use crate::profiles::placement_plan;

/// Per-AI-player scratch state carried across ticks. The engine owns a
/// `HashMap<String, AiState>` keyed by player id.
#[derive(Debug, Clone, Default)]
pub struct AiState {
    placement_index: usize,
    mode_flipped: bool,
    next_salvo_at_ms: u64,
}

/// Run the AI for every AI-controlled, still-alive player. Returns the
/// events generated this tick (building placements don't emit events per
/// §4.12's event list, but missile launches do).
pub fn run(
    session: &mut GameSession,
    catalog: &Catalog,
    rng: &mut ChaCha8Rng,
    ai_states: &mut HashMap<String, AiState>,
) -> Vec<SimEvent> {
    let mut events = Vec::new();

    let ai_player_ids: Vec<String> = session
        .players
        .values()
        .filter(|p| p.is_ai && p.is_alive())
        .map(|p| p.id.clone())
        .collect();

    for player_id in ai_player_ids {
        let state = ai_states.entry(player_id.clone()).or_default();

        match session.phase {
            SessionPhase::Placement => run_placement(session, catalog, &player_id, state),
            SessionPhase::Escalation if session.defcon_level <= 3 => {
                run_mode_flip(session, &player_id, state)
            }
            SessionPhase::Launch => {
                events.extend(run_salvo(session, &player_id, rng, state));
            }
            _ => {}
        }
    }

    events
}

fn run_placement(session: &mut GameSession, catalog: &Catalog, player_id: &str, state: &mut AiState) {
    let Some(territory_id) = session.players.get(player_id).and_then(|p| p.territory_id.clone())
    else {
        return;
    };
    let Some(territory) = catalog.territory(&territory_id) else {
        return;
    };
    let plan = placement_plan(territory);
    if state.placement_index >= plan.len() {
        return;
    }

    let step = &plan[state.placement_index];
    state.placement_index += 1;

    let common = BuildingCommon {
        id: format!("{player_id}-ai-building-{}", state.placement_index),
        owner_id: player_id.to_string(),
        position: step.position,
        destroyed: false,
    };

    let building = match step.building_type {
        standoff_core::commands::PlaceableBuildingType::Silo => Building::Silo {
            common,
            mode: SiloMode::Defend,
            missile_ammo: session.config.starting_missile_ammo,
            interceptor_ammo: session.config.starting_interceptor_ammo,
            last_fire_time_ms: 0,
        },
        standoff_core::commands::PlaceableBuildingType::Radar => Building::Radar {
            common,
            range_km: standoff_core::constants::DEFAULT_RADAR_RANGE_KM,
            active: true,
        },
        standoff_core::commands::PlaceableBuildingType::Airfield => Building::Airfield {
            common,
            fighter_ammo: 4,
            bomber_ammo: 2,
        },
        standoff_core::commands::PlaceableBuildingType::SatelliteFacility => {
            Building::SatelliteFacility {
                common,
                satellite_stock: 2,
                launch_cooldown_ms: standoff_core::constants::SATELLITE_LAUNCH_COOLDOWN_MS,
                last_launch_time_ms: 0,
            }
        }
    };

    let id = building.id().to_string();
    session.buildings.insert(id, building);
}

fn run_mode_flip(session: &mut GameSession, player_id: &str, state: &mut AiState) {
    if state.mode_flipped {
        return;
    }
    for building in session.buildings.values_mut() {
        if building.owner_id() != player_id {
            continue;
        }
        if let Building::Silo { mode, .. } = building {
            *mode = SiloMode::Attack;
        }
    }
    state.mode_flipped = true;
}

fn run_salvo(
    session: &mut GameSession,
    player_id: &str,
    rng: &mut ChaCha8Rng,
    state: &mut AiState,
) -> Vec<SimEvent> {
    let now_ms = session.clock.timestamp_ms;
    if state.next_salvo_at_ms == 0 {
        state.next_salvo_at_ms =
            now_ms + rng.gen_range(AI_SALVO_INTERVAL_MIN_MS..=AI_SALVO_INTERVAL_MAX_MS);
        return Vec::new();
    }
    if now_ms < state.next_salvo_at_ms {
        return Vec::new();
    }
    state.next_salvo_at_ms =
        now_ms + rng.gen_range(AI_SALVO_INTERVAL_MIN_MS..=AI_SALVO_INTERVAL_MAX_MS);

    let enemy_ids: Vec<String> = session
        .players
        .values()
        .filter(|p| p.id != player_id && p.is_alive())
        .map(|p| p.id.clone())
        .collect();
    if enemy_ids.is_empty() {
        return Vec::new();
    }
    let enemy_id = &enemy_ids[rng.gen_range(0..enemy_ids.len())];
    let Some(enemy_territory_id) = session.players.get(enemy_id).and_then(|p| p.territory_id.clone())
    else {
        return Vec::new();
    };

    let mut enemy_cities: Vec<(String, u64, standoff_core::types::GeoPos)> = session
        .cities
        .values()
        .filter(|c| c.territory_id == enemy_territory_id && !c.destroyed)
        .map(|c| (c.id.clone(), c.population, c.geo_position))
        .collect();
    enemy_cities.sort_by(|a, b| b.1.cmp(&a.1));
    enemy_cities.truncate(AI_TOP_CITY_TARGETS);
    if enemy_cities.is_empty() {
        return Vec::new();
    }

    let attack_silo_ids: Vec<String> = session
        .buildings
        .values()
        .filter_map(|b| match b {
            Building::Silo {
                common,
                mode: SiloMode::Attack,
                missile_ammo,
                ..
            } if common.owner_id == player_id && !common.destroyed && *missile_ammo > 0 => {
                Some(common.id.clone())
            }
            _ => None,
        })
        .collect();

    let total_population: u64 = enemy_cities.iter().map(|(_, population, _)| population).sum();

    let mut events = Vec::new();
    for silo_id in &attack_silo_ids {
        let Some((_, _, target_geo)) = pick_population_weighted_city(&enemy_cities, total_population, rng) else {
            break;
        };
        let Some(Building::Silo {
            common,
            missile_ammo,
            ..
        }) = session.buildings.get_mut(silo_id)
        else {
            continue;
        };
        if *missile_ammo == 0 {
            continue;
        }
        *missile_ammo -= 1;
        let launch_geo = common.position;
        let distance_km = standoff_geo::great_circle::distance_km(launch_geo, target_geo);
        let flight_duration_ms = standoff_geo::flight_profile::flight_duration_ms(distance_km);
        let apex_altitude_m = standoff_geo::flight_profile::apex_altitude_m(distance_km);
        let missile_id = format!("{}-ai-icbm-{}", player_id, uuid::Uuid::new_v4());

        let missile = Missile::Icbm {
            common: MissileCommon {
                id: missile_id.clone(),
                owner_id: player_id.to_string(),
                kind: MissileKind::Icbm,
                launch_geo,
                target_geo,
                current_geo: launch_geo,
                launch_tick: session.clock.tick,
                flight_duration_ms,
                apex_altitude_m,
                progress: 0.0,
                intercepted: false,
                detonated: false,
            },
            source_silo_id: silo_id.clone(),
        };
        session.missiles.insert(missile_id.clone(), missile);
        events.push(SimEvent::MissileLaunch {
            missile_id,
            owner_id: player_id.to_string(),
            launch_geo,
            target_geo,
        });
    }

    events
}

/// Pick one city at random, weighted by population share, so a dense capital
/// draws more salvos than a small border town in the same top-N set (§4.9).
fn pick_population_weighted_city(
    cities: &[(String, u64, standoff_core::types::GeoPos)],
    total_population: u64,
    rng: &mut ChaCha8Rng,
) -> Option<(String, u64, standoff_core::types::GeoPos)> {
    if cities.is_empty() {
        return None;
    }
    if total_population == 0 {
        return cities.first().cloned();
    }
    let mut roll = rng.gen_range(0..total_population);
    for city in cities {
        if roll < city.1 {
            return Some(city.clone());
        }
        roll -= city.1;
    }
    cities.last().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use standoff_core::config::SessionConfig;
    use standoff_core::entities::{City, Player};
    use standoff_core::types::{GeoPos, SimClock};
    use std::collections::HashMap as StdHashMap;

    fn fresh_session() -> GameSession {
        GameSession {
            id: "s".into(),
            clock: SimClock::default(),
            phase: SessionPhase::Placement,
            defcon_level: 5,
            defcon_ms_remaining: 0,
            game_speed: 1,
            players: StdHashMap::new(),
            territories: StdHashMap::new(),
            cities: StdHashMap::new(),
            buildings: StdHashMap::new(),
            missiles: StdHashMap::new(),
            satellites: StdHashMap::new(),
            hacking_nodes: StdHashMap::new(),
            hacking_connections: Vec::new(),
            hacking_traces: StdHashMap::new(),
            config: SessionConfig::default(),
        }
    }

    #[test]
    fn placement_places_one_building_per_tick_per_ai() {
        let mut session = fresh_session();
        let catalog = Catalog::embedded();
        let territory_id = catalog.territories[0].id.clone();
        let mut ai = Player::new("ai-1", "Bot", true);
        ai.territory_id = Some(territory_id);
        session.players.insert(ai.id.clone(), ai);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut states = StdHashMap::new();

        run(&mut session, &catalog, &mut rng, &mut states);
        assert_eq!(session.buildings.len(), 1);
        run(&mut session, &catalog, &mut rng, &mut states);
        assert_eq!(session.buildings.len(), 2);
    }

    #[test]
    fn salvo_only_fires_from_attack_mode_silos_with_ammo() {
        let mut session = fresh_session();
        session.phase = SessionPhase::Launch;
        session.defcon_level = 1;
        session.clock.timestamp_ms = 100_000;

        let mut attacker = Player::new("ai-1", "Bot", true);
        attacker.territory_id = Some("home".into());
        session.players.insert(attacker.id.clone(), attacker);

        let mut victim = Player::new("human", "Human", false);
        victim.territory_id = Some("victim-land".into());
        victim.population_remaining = 100;
        session.players.insert(victim.id.clone(), victim);

        session.cities.insert(
            "victim-city".into(),
            City {
                id: "victim-city".into(),
                territory_id: "victim-land".into(),
                geo_position: GeoPos::new(10.0, 10.0),
                population: 1000,
                max_population: 1000,
                destroyed: false,
            },
        );

        session.buildings.insert(
            "silo-1".into(),
            Building::Silo {
                common: BuildingCommon {
                    id: "silo-1".into(),
                    owner_id: "ai-1".into(),
                    position: GeoPos::new(0.0, 0.0),
                    destroyed: false,
                },
                mode: SiloMode::Attack,
                missile_ammo: 1,
                interceptor_ammo: 0,
                last_fire_time_ms: 0,
            },
        );

        let catalog = Catalog::embedded();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut states = StdHashMap::new();

        // First call only arms the salvo timer.
        let events = run(&mut session, &catalog, &mut rng, &mut states);
        assert!(events.is_empty());
        assert_eq!(session.missiles.len(), 0);

        // Force the timer to have elapsed.
        states.get_mut("ai-1").unwrap().next_salvo_at_ms = 0;
        session.clock.timestamp_ms += 1;
        let events = run(&mut session, &catalog, &mut rng, &mut states);
        assert_eq!(events.len(), 1);
        assert_eq!(session.missiles.len(), 1);

        let silo = session.buildings.get("silo-1").unwrap();
        if let Building::Silo { missile_ammo, .. } = silo {
            assert_eq!(*missile_ammo, 0);
        } else {
            panic!("expected silo");
        }
    }

    #[test]
    fn population_weighted_pick_favors_the_denser_city_over_many_rolls() {
        let cities = vec![
            ("big".to_string(), 990_000u64, GeoPos::new(0.0, 0.0)),
            ("small".to_string(), 10_000u64, GeoPos::new(1.0, 1.0)),
        ];
        let total: u64 = cities.iter().map(|(_, p, _)| p).sum();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut big_count = 0;
        for _ in 0..500 {
            if let Some((id, ..)) = pick_population_weighted_city(&cities, total, &mut rng) {
                if id == "big" {
                    big_count += 1;
                }
            }
        }
        assert!(big_count > 450, "expected population weighting to favor the big city, got {big_count}/500");
    }
}
