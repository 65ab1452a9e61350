//! Missile-launch command handlers (§4.5): ICBM launch authorization, the
//! manual-intercept rail search, and intercept-feasibility reporting.
//!
//! Grounded on `deterrence-sim::systems::fire_control`'s shape: validate
//! every precondition before mutating anything, then mutate and return or
//! push events rather than surfacing a caller-visible error mid-mutation.

use standoff_core::entities::{Building, InterceptTarget, Missile, MissileCommon};
use standoff_core::enums::{HackType, InterceptorStatus, MissileKind, SessionPhase, SiloMode};
use standoff_core::error::CommandError;
use standoff_core::events::SimEvent;
use standoff_core::state::{GameSession, InterceptFeasibility};
use standoff_core::types::GeoPos;
use standoff_geo::{flight_profile, great_circle};

use super::ballistics::{search_intercept_point, search_intercept_point_satellite, InterceptSolution};
use super::hacking;

/// Handle a validated `launch_missile` command: an ICBM launch from an
/// owned, non-destroyed, attack-mode silo with ammo remaining. Only legal
/// once DEFCON 1 is reached (§4.5).
pub fn launch_missile(
    session: &mut GameSession,
    player_id: &str,
    silo_id: &str,
    target_position: GeoPos,
) -> Result<SimEvent, CommandError> {
    if session.phase != SessionPhase::Launch {
        return Err(CommandError::WrongPhase);
    }

    let silo = session
        .buildings
        .get_mut(silo_id)
        .ok_or_else(|| CommandError::UnknownEntity(silo_id.to_string()))?;
    if silo.owner_id() != player_id {
        return Err(CommandError::NotOwner(silo_id.to_string()));
    }
    if silo.destroyed() {
        return Err(CommandError::UnknownEntity(silo_id.to_string()));
    }
    if hacking::is_compromised(session, silo_id, HackType::DelaySilo) {
        return Err(CommandError::SiloDelayed(silo_id.to_string()));
    }

    let launch_geo = silo.common().position;

    match silo {
        Building::Silo { mode, missile_ammo, .. } => {
            if *mode != SiloMode::Attack {
                return Err(CommandError::WrongSiloMode);
            }
            if *missile_ammo == 0 {
                return Err(CommandError::AmmoExhausted);
            }
            *missile_ammo -= 1;
        }
        _ => return Err(CommandError::WrongSiloMode),
    }

    let distance_km = great_circle::distance_km(launch_geo, target_position);
    let flight_duration_ms = flight_profile::flight_duration_ms(distance_km);
    let apex_altitude_m = flight_profile::apex_altitude_m(distance_km);

    let missile_id = format!("{player_id}-icbm-{}", uuid::Uuid::new_v4());
    let common = MissileCommon {
        id: missile_id.clone(),
        owner_id: player_id.to_string(),
        kind: MissileKind::Icbm,
        launch_geo,
        target_geo: target_position,
        current_geo: launch_geo,
        launch_tick: session.clock.tick,
        flight_duration_ms,
        apex_altitude_m,
        progress: 0.0,
        intercepted: false,
        detonated: false,
    };
    session.missiles.insert(
        missile_id.clone(),
        Missile::Icbm { common, source_silo_id: silo_id.to_string() },
    );

    Ok(SimEvent::MissileLaunch {
        missile_id,
        owner_id: player_id.to_string(),
        launch_geo,
        target_geo: target_position,
    })
}

/// Handle a `manual_intercept` command, launching one interceptor from each
/// listed silo against `target`. Each silo is validated and resolved
/// independently; one infeasible silo doesn't block the rest.
pub fn manual_intercept(
    session: &mut GameSession,
    player_id: &str,
    target: &InterceptTarget,
    silo_ids: &[String],
) -> Vec<Result<SimEvent, CommandError>> {
    silo_ids
        .iter()
        .map(|silo_id| launch_interceptor(session, player_id, silo_id, target))
        .collect()
}

/// Find a feasible rail against `target` from `source_geo`, branching on
/// whether the target is an in-flight ICBM or an orbiting satellite (§4.6).
fn search_intercept_solution(session: &GameSession, target: &InterceptTarget, source_geo: GeoPos) -> Option<InterceptSolution> {
    match target {
        InterceptTarget::Missile { id } => {
            let target_common = match session.missiles.get(id) {
                Some(missile @ Missile::Icbm { .. }) if !missile.is_resolved() => missile.common().clone(),
                _ => return None,
            };
            search_intercept_point(&target_common, source_geo)
        }
        InterceptTarget::Satellite { id } => {
            let satellite = session.satellites.get(id).filter(|s| !s.destroyed)?;
            search_intercept_point_satellite(satellite, source_geo, session.clock.timestamp_ms)
        }
    }
}

fn launch_interceptor(
    session: &mut GameSession,
    player_id: &str,
    silo_id: &str,
    target: &InterceptTarget,
) -> Result<SimEvent, CommandError> {
    let silo = session
        .buildings
        .get(silo_id)
        .ok_or_else(|| CommandError::UnknownEntity(silo_id.to_string()))?;
    if silo.owner_id() != player_id {
        return Err(CommandError::NotOwner(silo_id.to_string()));
    }
    if silo.destroyed() {
        return Err(CommandError::UnknownEntity(silo_id.to_string()));
    }
    let interceptor_ammo = match silo {
        Building::Silo { interceptor_ammo, .. } => *interceptor_ammo,
        _ => return Err(CommandError::WrongSiloMode),
    };
    if interceptor_ammo == 0 {
        return Err(CommandError::AmmoExhausted);
    }
    let source_geo = silo.common().position;

    let solution = search_intercept_solution(session, target, source_geo).ok_or(CommandError::NoInterceptSolution)?;

    if let Some(Building::Silo { interceptor_ammo, .. }) = session.buildings.get_mut(silo_id) {
        *interceptor_ammo -= 1;
    }

    let interceptor_id = format!("{player_id}-interceptor-{}", uuid::Uuid::new_v4());
    let common = MissileCommon {
        id: interceptor_id.clone(),
        owner_id: player_id.to_string(),
        kind: MissileKind::Interceptor,
        launch_geo: source_geo,
        target_geo: solution.rail_end_geo,
        current_geo: source_geo,
        launch_tick: session.clock.tick,
        flight_duration_ms: solution.flight_duration_ms,
        apex_altitude_m: 0.0,
        progress: 0.0,
        intercepted: false,
        detonated: false,
    };
    session.missiles.insert(
        interceptor_id.clone(),
        Missile::Interceptor {
            common,
            source_silo_id: silo_id.to_string(),
            target: target.clone(),
            rail_start_geo: source_geo,
            rail_end_geo: solution.rail_end_geo,
            rail_end_altitude_m: solution.rail_end_altitude_m,
            fuel_seconds: standoff_core::constants::INTERCEPTOR_FUEL_SECONDS_DEFAULT,
            tracking_radar_ids: Vec::new(),
            has_guidance: false,
            status: InterceptorStatus::Active,
            miss_behavior: None,
            ticks_without_guidance: 0,
            coast_ticks: 0,
        },
    );

    Ok(SimEvent::MissileLaunch {
        missile_id: interceptor_id,
        owner_id: player_id.to_string(),
        launch_geo: source_geo,
        target_geo: solution.rail_end_geo,
    })
}

/// Handle a `request_intercept_info` command: report, per owned silo,
/// whether a rail solution exists against `target` and a rough
/// hit-probability estimate (§6).
pub fn request_intercept_info(
    session: &GameSession,
    player_id: &str,
    target: &InterceptTarget,
) -> Result<Vec<InterceptFeasibility>, CommandError> {
    let target_exists = match target {
        InterceptTarget::Missile { id } => {
            matches!(session.missiles.get(id), Some(missile @ Missile::Icbm { .. }) if !missile.is_resolved())
        }
        InterceptTarget::Satellite { id } => session.satellites.get(id).is_some_and(|s| !s.destroyed),
    };
    if !target_exists {
        return Err(CommandError::UnknownEntity(target.id().to_string()));
    }

    let mut results = Vec::new();
    for building in session.buildings.values() {
        if building.owner_id() != player_id || building.destroyed() {
            continue;
        }
        let Building::Silo { interceptor_ammo, .. } = building else {
            continue;
        };
        if *interceptor_ammo == 0 {
            continue;
        }
        let source_geo = building.common().position;
        match search_intercept_solution(session, target, source_geo) {
            Some(solution) => results.push(InterceptFeasibility {
                silo_id: building.id().to_string(),
                feasible: true,
                estimated_hit_probability: solution.estimated_hit_probability,
            }),
            None => results.push(InterceptFeasibility {
                silo_id: building.id().to_string(),
                feasible: false,
                estimated_hit_probability: 0.0,
            }),
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;

    fn session_with_silo(phase: SessionPhase, mode: SiloMode, ammo: u32) -> GameSession {
        let mut session = GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase,
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
        };
        session.buildings.insert(
            "silo-1".into(),
            Building::Silo {
                common: standoff_core::entities::BuildingCommon {
                    id: "silo-1".into(),
                    owner_id: "p1".into(),
                    position: GeoPos::new(0.0, 0.0),
                    destroyed: false,
                },
                mode,
                missile_ammo: ammo,
                interceptor_ammo: 4,
                last_fire_time_ms: 0,
            },
        );
        session
    }

    #[test]
    fn launch_rejected_outside_defcon_one() {
        let mut session = session_with_silo(SessionPhase::Escalation, SiloMode::Attack, 2);
        let result = launch_missile(&mut session, "p1", "silo-1", GeoPos::new(10.0, 10.0));
        assert_eq!(result, Err(CommandError::WrongPhase));
    }

    #[test]
    fn launch_rejected_without_attack_mode() {
        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Defend, 2);
        let result = launch_missile(&mut session, "p1", "silo-1", GeoPos::new(10.0, 10.0));
        assert_eq!(result, Err(CommandError::WrongSiloMode));
    }

    #[test]
    fn launch_succeeds_and_decrements_ammo() {
        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Attack, 2);
        let result = launch_missile(&mut session, "p1", "silo-1", GeoPos::new(10.0, 10.0));
        assert!(result.is_ok());
        assert_eq!(session.missiles.len(), 1);
        match &session.buildings["silo-1"] {
            Building::Silo { missile_ammo, .. } => assert_eq!(*missile_ammo, 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn launch_rejected_when_ammo_exhausted() {
        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Attack, 0);
        let result = launch_missile(&mut session, "p1", "silo-1", GeoPos::new(10.0, 10.0));
        assert_eq!(result, Err(CommandError::AmmoExhausted));
    }

    #[test]
    fn launch_rejected_while_delay_silo_hack_is_compromising_it() {
        use standoff_core::entities::HackingTrace;
        use standoff_core::enums::HackStatus;

        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Attack, 2);
        session.hacking_traces.insert(
            "hack-1".into(),
            HackingTrace {
                id: "hack-1".into(),
                attacker_player_id: "p2".into(),
                target_building_id: "silo-1".into(),
                hack_type: HackType::DelaySilo,
                progress: 1.0,
                trace_progress: 0.0,
                status: HackStatus::Complete,
                route_node_ids: Vec::new(),
                compromise_expires_at_ms: Some(session.clock.timestamp_ms + 30_000),
            },
        );
        let result = launch_missile(&mut session, "p1", "silo-1", GeoPos::new(10.0, 10.0));
        assert_eq!(result, Err(CommandError::SiloDelayed("silo-1".into())));
    }

    #[test]
    fn manual_intercept_can_target_a_satellite_directly_overhead() {
        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Attack, 2);
        session.satellites.insert(
            "sat-1".into(),
            standoff_core::entities::Satellite {
                id: "sat-1".into(),
                owner_id: "p2".into(),
                source_facility_id: "fac-1".into(),
                launch_epoch_ms: 0,
                orbital_period_ms: 5_400_000,
                orbital_altitude_km: 500.0,
                inclination_deg: 0.0,
                starting_longitude_deg: 0.0,
                destroyed: false,
                health: 100.0,
                progress: 0.0,
                ground_position: GeoPos::new(0.0, 0.0),
            },
        );
        let target = InterceptTarget::Satellite { id: "sat-1".into() };
        let results = manual_intercept(&mut session, "p1", &target, &["silo-1".to_string()]);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok(), "expected a feasible satellite intercept, got {:?}", results[0]);
        assert!(session.missiles.values().any(
            |m| matches!(m, Missile::Interceptor { target, .. } if *target == InterceptTarget::Satellite { id: "sat-1".into() })
        ));
    }

    #[test]
    fn manual_intercept_rejects_an_unknown_satellite() {
        let mut session = session_with_silo(SessionPhase::Launch, SiloMode::Attack, 2);
        let target = InterceptTarget::Satellite { id: "sat-missing".into() };
        let results = manual_intercept(&mut session, "p1", &target, &["silo-1".to_string()]);
        assert_eq!(results[0], Err(CommandError::NoInterceptSolution));
    }
}
