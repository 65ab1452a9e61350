//! Per-tick missile advance, interceptor guidance, and rail-interceptor
//! feasibility search (§4.5).
//!
//! Grounded on `deterrence-sim::systems::intercept`'s proximity-check →
//! `rng.gen_bool(pk)` → resolve-and-despawn shape, extended with the rail
//! feasibility search this spec layers on top of plain proximity.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use standoff_core::constants::{
    GUIDANCE_GRACE_MS, INTERCEPTOR_FUEL_SECONDS_DEFAULT, INTERCEPTOR_SPEED_KM_PER_SEC,
    INTERCEPT_PROGRESS_MAX, INTERCEPT_PROGRESS_MIN, INTERCEPT_PROXIMITY_KM, INTERCEPT_SEARCH_SAMPLES,
    PK_BASE_BOOST, PK_BASE_MIDCOURSE, PK_BASE_REENTRY, PK_LOW_FUEL_PENALTY, PK_LOW_FUEL_THRESHOLD,
    PK_MAX, PK_MAX_RADAR_BONUS, PK_MIN, PK_PER_RADAR_BONUS, PK_RANDOM_VARIANCE,
    SATELLITE_INTERCEPT_WINDOW_MS, TICK_MS,
};
use standoff_core::entities::{Building, InterceptTarget, Missile, MissileCommon, Satellite};
use standoff_core::enums::InterceptorStatus;
use standoff_core::events::SimEvent;
use standoff_core::state::GameSession;
use standoff_core::types::GeoPos;
use standoff_geo::flight_profile::{self, FlightPhase, PhaseSplit};
use standoff_geo::great_circle;

use super::damage;
use super::satellites;

const GUIDANCE_GRACE_TICKS: u32 = (GUIDANCE_GRACE_MS / TICK_MS) as u32;

/// A feasible interceptor rail computed against an ICBM's remaining path.
#[derive(Debug, Clone, Copy)]
pub struct InterceptSolution {
    pub rail_end_geo: GeoPos,
    pub rail_end_altitude_m: f64,
    pub flight_duration_ms: u64,
    pub estimated_hit_probability: f64,
}

/// Search for the earliest point along `target`'s remaining path, within
/// `[INTERCEPT_PROGRESS_MIN, INTERCEPT_PROGRESS_MAX]`, that an interceptor
/// launched right now from `source` could reach no later than the ICBM and
/// within its fuel budget (§4.5).
pub fn search_intercept_point(target: &MissileCommon, source: GeoPos) -> Option<InterceptSolution> {
    let split = PhaseSplit::for_duration(target.flight_duration_ms);
    let lower = INTERCEPT_PROGRESS_MIN.max(target.progress);
    if lower >= INTERCEPT_PROGRESS_MAX {
        return None;
    }

    for i in 0..=INTERCEPT_SEARCH_SAMPLES {
        let t = lower + (INTERCEPT_PROGRESS_MAX - lower) * (i as f64 / INTERCEPT_SEARCH_SAMPLES as f64);
        let point = great_circle::interpolate(target.launch_geo, target.target_geo, t);
        let icbm_time_to_point_ms = ((t - target.progress) * target.flight_duration_ms as f64).max(0.0);

        let interceptor_distance_km = great_circle::distance_km(source, point);
        let interceptor_travel_ms = interceptor_distance_km / INTERCEPTOR_SPEED_KM_PER_SEC * 1000.0;

        let within_fuel = interceptor_travel_ms / 1000.0 <= INTERCEPTOR_FUEL_SECONDS_DEFAULT;
        if interceptor_travel_ms <= icbm_time_to_point_ms && within_fuel {
            let elapsed_ms = (t * target.flight_duration_ms as f64) as u64;
            let altitude_m = flight_profile::altitude_m(elapsed_ms, target.apex_altitude_m, split);
            let phase_base = match split.phase_at(elapsed_ms) {
                FlightPhase::Boost => PK_BASE_BOOST,
                FlightPhase::Midcourse => PK_BASE_MIDCOURSE,
                FlightPhase::Reentry => PK_BASE_REENTRY,
            };
            return Some(InterceptSolution {
                rail_end_geo: point,
                rail_end_altitude_m: altitude_m,
                flight_duration_ms: interceptor_travel_ms.round() as u64,
                estimated_hit_probability: phase_base.clamp(PK_MIN, PK_MAX),
            });
        }
    }
    None
}

/// Search for an interceptor rail against a satellite's predicted future
/// ground track, the orbital analog of [`search_intercept_point`] (§4.6).
/// Satellites hold altitude and velocity steady, so the search samples
/// forward in time rather than along a progress window.
pub fn search_intercept_point_satellite(satellite: &Satellite, source: GeoPos, now_ms: u64) -> Option<InterceptSolution> {
    let elapsed_at_launch = now_ms.saturating_sub(satellite.launch_epoch_ms);
    for i in 1..=INTERCEPT_SEARCH_SAMPLES {
        let dt_ms = i as u64 * SATELLITE_INTERCEPT_WINDOW_MS / INTERCEPT_SEARCH_SAMPLES as u64;
        let elapsed_ms = elapsed_at_launch + dt_ms;
        let progress = (elapsed_ms % satellite.orbital_period_ms) as f64 / satellite.orbital_period_ms as f64;
        let point = satellites::ground_position_at(satellite, progress);

        let interceptor_distance_km = great_circle::distance_km(source, point);
        let interceptor_travel_ms = interceptor_distance_km / INTERCEPTOR_SPEED_KM_PER_SEC * 1000.0;
        let within_fuel = interceptor_travel_ms / 1000.0 <= INTERCEPTOR_FUEL_SECONDS_DEFAULT;

        if interceptor_travel_ms <= dt_ms as f64 && within_fuel {
            return Some(InterceptSolution {
                rail_end_geo: point,
                rail_end_altitude_m: satellite.orbital_altitude_km * 1000.0,
                flight_duration_ms: interceptor_travel_ms.round() as u64,
                estimated_hit_probability: PK_BASE_MIDCOURSE.clamp(PK_MIN, PK_MAX),
            });
        }
    }
    None
}

/// Advance every in-flight missile by `dt_ms`, refresh interceptor guidance,
/// and resolve anything that has reached the end of its rail or flight path.
pub fn step(session: &mut GameSession, dt_ms: u64, rng: &mut ChaCha8Rng, events: &mut Vec<SimEvent>) {
    update_guidance(session);

    let ids: Vec<String> = session.missiles.keys().cloned().collect();
    for id in &ids {
        advance_one(session, id, dt_ms);
    }
    for id in &ids {
        resolve_one(session, id, rng, events);
    }

    session.missiles.retain(|_, m| !m.is_resolved());
}

fn advance_one(session: &mut GameSession, id: &str, dt_ms: u64) {
    let Some(missile) = session.missiles.get_mut(id) else {
        return;
    };
    if missile.is_resolved() {
        return;
    }
    if let Missile::Interceptor { status, .. } = missile {
        if *status != InterceptorStatus::Active {
            return;
        }
    }

    let common = missile.common_mut();
    let elapsed_ms = (common.progress * common.flight_duration_ms as f64) as u64 + dt_ms;
    common.progress = flight_profile::progress(elapsed_ms, common.flight_duration_ms);
    common.current_geo = great_circle::interpolate(common.launch_geo, common.target_geo, common.progress);

    if let Missile::Interceptor { fuel_seconds, .. } = missile {
        *fuel_seconds = (*fuel_seconds - dt_ms as f64 / 1000.0).max(0.0);
    }
}

fn update_guidance(session: &mut GameSession) {
    let radars: Vec<(String, GeoPos, f64)> = session
        .buildings
        .values()
        .filter_map(|b| match b {
            Building::Radar { common, range_km, active } if *active && !common.destroyed => {
                Some((common.id.clone(), common.position, *range_km))
            }
            _ => None,
        })
        .collect();

    for missile in session.missiles.values_mut() {
        let Missile::Interceptor {
            common,
            tracking_radar_ids,
            has_guidance,
            status,
            ticks_without_guidance,
            ..
        } = missile
        else {
            continue;
        };
        if *status != InterceptorStatus::Active {
            continue;
        }

        let tracking: Vec<String> = radars
            .iter()
            .filter(|(_, pos, range_km)| great_circle::distance_km(*pos, common.current_geo) <= *range_km)
            .map(|(radar_id, ..)| radar_id.clone())
            .collect();

        if tracking.is_empty() {
            *ticks_without_guidance += 1;
            if *ticks_without_guidance > GUIDANCE_GRACE_TICKS {
                *has_guidance = false;
            }
        } else {
            *ticks_without_guidance = 0;
            *has_guidance = true;
        }
        *tracking_radar_ids = tracking;
    }
}

fn resolve_one(session: &mut GameSession, id: &str, rng: &mut ChaCha8Rng, events: &mut Vec<SimEvent>) {
    let is_icbm = matches!(session.missiles.get(id), Some(Missile::Icbm { .. }));
    if is_icbm {
        resolve_icbm_tick(session, id, events);
    } else {
        resolve_interceptor_tick(session, id, rng, events);
    }
}

fn resolve_icbm_tick(session: &mut GameSession, id: &str, events: &mut Vec<SimEvent>) {
    let should_detonate = matches!(
        session.missiles.get(id),
        Some(Missile::Icbm { common, .. }) if !common.intercepted && !common.detonated && common.progress >= 1.0
    );
    if !should_detonate {
        return;
    }
    if let Some(Missile::Icbm { common, .. }) = session.missiles.get_mut(id) {
        common.detonated = true;
    }
    damage::detonate_icbm(session, id, events);
}

fn mark_missed(session: &mut GameSession, id: &str) {
    if let Some(Missile::Interceptor { status, .. }) = session.missiles.get_mut(id) {
        *status = InterceptorStatus::Missed;
    }
}

fn resolve_interceptor_tick(session: &mut GameSession, id: &str, rng: &mut ChaCha8Rng, events: &mut Vec<SimEvent>) {
    let Some(Missile::Interceptor {
        common,
        target,
        rail_end_altitude_m,
        fuel_seconds,
        tracking_radar_ids,
        has_guidance,
        status,
        coast_ticks,
        ..
    }) = session.missiles.get(id).cloned()
    else {
        return;
    };

    match status {
        InterceptorStatus::Hit | InterceptorStatus::Crashed => {}
        InterceptorStatus::Missed => {
            let ticks = coast_ticks + 1;
            if ticks >= standoff_core::constants::MISS_COAST_TICKS {
                if let Some(Missile::Interceptor { common, status, .. }) = session.missiles.get_mut(id) {
                    common.detonated = true;
                    *status = InterceptorStatus::Crashed;
                }
            } else if let Some(Missile::Interceptor { coast_ticks, .. }) = session.missiles.get_mut(id) {
                *coast_ticks = ticks;
            }
        }
        InterceptorStatus::Active => {
            if common.progress < 1.0 {
                return;
            }
            if !has_guidance {
                mark_missed(session, id);
                return;
            }

            let (target_geo, target_altitude_m, phase_base) = match &target {
                InterceptTarget::Missile { id: target_missile_id } => {
                    let target_common = match session.missiles.get(target_missile_id) {
                        Some(Missile::Icbm { common, .. }) if !common.intercepted && !common.detonated => {
                            common.clone()
                        }
                        _ => {
                            mark_missed(session, id);
                            return;
                        }
                    };
                    let split = PhaseSplit::for_duration(target_common.flight_duration_ms);
                    let elapsed_ms = (target_common.progress * target_common.flight_duration_ms as f64) as u64;
                    let altitude_m = flight_profile::altitude_m(elapsed_ms, target_common.apex_altitude_m, split);
                    let phase_base = match split.phase_at(elapsed_ms) {
                        FlightPhase::Boost => PK_BASE_BOOST,
                        FlightPhase::Midcourse => PK_BASE_MIDCOURSE,
                        FlightPhase::Reentry => PK_BASE_REENTRY,
                    };
                    (target_common.current_geo, altitude_m, phase_base)
                }
                InterceptTarget::Satellite { id: target_satellite_id } => {
                    match session.satellites.get(target_satellite_id) {
                        Some(satellite) if !satellite.destroyed => (
                            satellite.ground_position,
                            satellite.orbital_altitude_km * 1000.0,
                            PK_BASE_MIDCOURSE,
                        ),
                        _ => {
                            mark_missed(session, id);
                            return;
                        }
                    }
                }
            };

            let horizontal_km = great_circle::distance_km(common.current_geo, target_geo);
            let vertical_km = (rail_end_altitude_m - target_altitude_m).abs() / 1000.0;
            let proximity_km = (horizontal_km.powi(2) + vertical_km.powi(2)).sqrt();

            if proximity_km > INTERCEPT_PROXIMITY_KM {
                mark_missed(session, id);
                return;
            }

            let radar_bonus =
                (tracking_radar_ids.len().saturating_sub(1) as f64 * PK_PER_RADAR_BONUS).min(PK_MAX_RADAR_BONUS);
            let fuel_fraction = (fuel_seconds / INTERCEPTOR_FUEL_SECONDS_DEFAULT).clamp(0.0, 1.0);
            let fuel_penalty = if fuel_fraction < PK_LOW_FUEL_THRESHOLD {
                PK_LOW_FUEL_PENALTY
            } else {
                0.0
            };
            let variance = rng.gen_range(-PK_RANDOM_VARIANCE..=PK_RANDOM_VARIANCE);
            let pk = (phase_base + radar_bonus - fuel_penalty + variance).clamp(PK_MIN, PK_MAX);

            if rng.gen_bool(pk) {
                if let Some(Missile::Interceptor { common, status, .. }) = session.missiles.get_mut(id) {
                    common.detonated = true;
                    *status = InterceptorStatus::Hit;
                }
                match &target {
                    InterceptTarget::Missile { id: target_missile_id } => {
                        if let Some(Missile::Icbm { common, .. }) = session.missiles.get_mut(target_missile_id) {
                            common.intercepted = true;
                        }
                    }
                    InterceptTarget::Satellite { id: target_satellite_id } => {
                        satellites::damage_satellite(session, target_satellite_id, f64::MAX, events);
                    }
                }
                events.push(SimEvent::Interception { interceptor_id: id.to_string(), target: target.clone() });
            } else {
                mark_missed(session, id);
            }
        }
    }
}
