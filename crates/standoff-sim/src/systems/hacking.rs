//! Hacking subsystem (§4.7): route establishment over the static node graph,
//! per-tick progress/trace advancement, and compromise effects.
//!
//! A completed hack's effect is never applied by mutating the target
//! building in place (and then having to remember how to undo it) — other
//! systems (`fog`, `ballistics`, `satellites`) instead query
//! [`is_compromised`]/[`compromising_attacker`] against the live trace table.
//! The effect lapses for free once `compromise_expires_at_ms` passes.

use std::collections::{HashMap, VecDeque};

use standoff_catalog::Catalog;
use standoff_core::constants::HACK_COMPROMISE_DURATION_MS;
use standoff_core::entities::HackingTrace;
use standoff_core::enums::{HackStatus, HackType};
use standoff_core::error::CommandError;
use standoff_core::events::ServerMessage;
use standoff_core::state::{GameSession, ScanResult, TraceSummary};
use standoff_core::types::GeoPos;
use standoff_geo::great_circle;

/// Whether `building_id` is currently affected by a completed hack of
/// `hack_type` (used by other systems to suppress the defender's side of
/// the effect without needing to track/restore prior state).
pub fn is_compromised(session: &GameSession, building_id: &str, hack_type: HackType) -> bool {
    session.hacking_traces.values().any(|t| {
        t.target_building_id == building_id
            && t.hack_type == hack_type
            && t.status == HackStatus::Complete
            && t.compromise_expires_at_ms.is_some_and(|expiry| session.clock.timestamp_ms < expiry)
    })
}

/// The attacker currently benefiting from a completed hack of `hack_type`
/// against `building_id`, if any (used by `fog` for `RevealTarget`).
pub fn compromising_attacker(session: &GameSession, building_id: &str, hack_type: HackType) -> Option<String> {
    session
        .hacking_traces
        .values()
        .find(|t| {
            t.target_building_id == building_id
                && t.hack_type == hack_type
                && t.status == HackStatus::Complete
                && t.compromise_expires_at_ms.is_some_and(|expiry| session.clock.timestamp_ms < expiry)
        })
        .map(|t| t.attacker_player_id.clone())
}

/// Handle a `hack_scan` command: a network-wide sweep revealing every
/// non-destroyed enemy building (§4.7).
pub fn hack_scan(session: &GameSession, player_id: &str) -> Vec<ScanResult> {
    session
        .buildings
        .values()
        .filter(|b| b.owner_id() != player_id && !b.destroyed())
        .map(|b| ScanResult {
            building_id: b.id().to_string(),
            owner_id: b.owner_id().to_string(),
            position: b.common().position,
            kind: b.kind_name().to_string(),
        })
        .collect()
}

/// The owner, destroyed flag, and position of a hack target, looked up
/// across buildings and satellites — `DisableSatelliteComm` targets a
/// satellite directly rather than its ground facility (§4.7, §4.8).
fn resolve_hack_target(session: &GameSession, target_id: &str) -> Option<(String, bool, GeoPos)> {
    if let Some(b) = session.buildings.get(target_id) {
        return Some((b.owner_id().to_string(), b.destroyed(), b.common().position));
    }
    session
        .satellites
        .get(target_id)
        .map(|s| (s.owner_id.clone(), s.destroyed, s.ground_position))
}

fn target_owner(session: &GameSession, target_id: &str) -> Option<String> {
    session
        .buildings
        .get(target_id)
        .map(|b| b.owner_id().to_string())
        .or_else(|| session.satellites.get(target_id).map(|s| s.owner_id.clone()))
}

/// Handle a `hack_start` command: establish a route through the hacking
/// network (explicit or auto-pathed) and begin a new trace.
pub fn hack_start(
    session: &mut GameSession,
    player_id: &str,
    target_building_id: &str,
    hack_type: HackType,
    route: Option<Vec<String>>,
) -> Result<String, CommandError> {
    let (owner_id, destroyed, target_position) = resolve_hack_target(session, target_building_id)
        .ok_or_else(|| CommandError::UnknownEntity(target_building_id.to_string()))?;
    if owner_id == player_id {
        return Err(CommandError::CannotHackOwnBuilding);
    }
    if destroyed {
        return Err(CommandError::UnknownEntity(target_building_id.to_string()));
    }

    let already_running = session.hacking_traces.values().any(|t| {
        t.attacker_player_id == player_id
            && t.target_building_id == target_building_id
            && t.hack_type == hack_type
            && matches!(t.status, HackStatus::Routing | HackStatus::Active)
    });
    if already_running {
        return Err(CommandError::HackAlreadyRunning);
    }

    let route_node_ids = match route {
        Some(explicit) => {
            if !route_is_valid(session, &explicit) {
                return Err(CommandError::NoRouteFound);
            }
            explicit
        }
        None => {
            let source = nearest_up_node(session, attacker_origin(session, player_id))
                .ok_or(CommandError::NoRouteFound)?;
            let destination = nearest_up_node(session, target_position).ok_or(CommandError::NoRouteFound)?;
            shortest_path(session, &source, &destination).ok_or(CommandError::NoRouteFound)?
        }
    };

    let hack_id = format!("hack-{}", uuid::Uuid::new_v4());
    session.hacking_traces.insert(
        hack_id.clone(),
        HackingTrace {
            id: hack_id.clone(),
            attacker_player_id: player_id.to_string(),
            target_building_id: target_building_id.to_string(),
            hack_type,
            progress: 0.0,
            trace_progress: 0.0,
            status: HackStatus::Active,
            route_node_ids,
            compromise_expires_at_ms: None,
        },
    );
    Ok(hack_id)
}

/// Handle a `hack_disconnect` command: the attacker voluntarily abandons an
/// in-progress hack before it completes or is traced.
pub fn hack_disconnect(session: &mut GameSession, player_id: &str, hack_id: &str) -> Result<(), CommandError> {
    let trace = session
        .hacking_traces
        .get(hack_id)
        .ok_or_else(|| CommandError::UnknownEntity(hack_id.to_string()))?;
    if trace.attacker_player_id != player_id {
        return Err(CommandError::NotOwner(hack_id.to_string()));
    }
    session.hacking_traces.remove(hack_id);
    Ok(())
}

/// Handle a `hack_purge` command: the defender clears every hack (in
/// progress or completed) currently targeting one of their own buildings.
pub fn hack_purge(session: &mut GameSession, player_id: &str, target_building_id: &str) -> Result<u32, CommandError> {
    let owner_id =
        target_owner(session, target_building_id).ok_or_else(|| CommandError::UnknownEntity(target_building_id.to_string()))?;
    if owner_id != player_id {
        return Err(CommandError::NotOwner(target_building_id.to_string()));
    }

    let purged: Vec<String> = session
        .hacking_traces
        .iter()
        .filter(|(_, t)| t.target_building_id == target_building_id)
        .map(|(id, _)| id.clone())
        .collect();
    let count = purged.len() as u32;
    for id in purged {
        session.hacking_traces.remove(&id);
    }
    Ok(count)
}

/// Handle a `hack_trace` command: report every hack targeting one of the
/// caller's buildings, revealing the attacker only once `trace_progress` has
/// advanced past zero (§4.7).
pub fn hack_trace(session: &GameSession, player_id: &str) -> Vec<TraceSummary> {
    session
        .hacking_traces
        .values()
        .filter(|t| target_owner(session, &t.target_building_id).as_deref() == Some(player_id))
        .map(|t| TraceSummary {
            hack_id: t.id.clone(),
            target_building_id: t.target_building_id.clone(),
            hack_type: t.hack_type,
            progress: t.progress,
            trace_progress: t.trace_progress,
            attacker_id: (t.trace_progress > 0.0).then(|| t.attacker_player_id.clone()),
        })
        .collect()
}

/// Advance every active trace's progress/trace-progress for one tick,
/// completing, tracing, or lapsing as thresholds are crossed, and report
/// what happened to whoever needs to know: `HackProgress` to the attacker
/// every active tick, `HackComplete`/`SystemCompromised` to attacker/defender
/// on completion, `IntrusionAlert` to the defender as soon as the trace
/// becomes visible, and `HackTraced` to the defender once it fully resolves
/// (§4.7).
pub fn step(session: &mut GameSession, catalog: &Catalog) -> Vec<(String, ServerMessage)> {
    let now_ms = session.clock.timestamp_ms;
    let ids: Vec<String> = session.hacking_traces.keys().cloned().collect();
    let mut messages = Vec::new();

    for id in ids {
        let Some(trace) = session.hacking_traces.get(&id).cloned() else {
            continue;
        };

        match trace.status {
            HackStatus::Active | HackStatus::Routing => {
                let Some(curve) = catalog.hack_curve(trace.hack_type) else {
                    continue;
                };
                let route_len = trace.route_node_ids.len().max(1) as f64;
                let was_traced_visible = trace.trace_progress > 0.0;
                let new_progress = (trace.progress + curve.progress_per_tick).min(1.0);
                let new_trace_progress = (trace.trace_progress + curve.trace_per_tick / route_len).min(1.0);

                messages.push((
                    trace.attacker_player_id.clone(),
                    ServerMessage::HackProgress { hack_id: trace.id.clone(), progress: new_progress },
                ));

                if new_trace_progress >= 1.0 {
                    if let Some(t) = session.hacking_traces.get_mut(&id) {
                        t.progress = new_progress;
                        t.trace_progress = new_trace_progress;
                        t.status = HackStatus::Traced;
                    }
                    if let Some(defender_id) = target_owner(session, &trace.target_building_id) {
                        messages.push((
                            defender_id,
                            ServerMessage::HackTraced {
                                hack_id: trace.id.clone(),
                                attacker_id: trace.attacker_player_id.clone(),
                            },
                        ));
                    }
                } else if new_progress >= 1.0 {
                    let expires_at_ms = now_ms + HACK_COMPROMISE_DURATION_MS;
                    if let Some(t) = session.hacking_traces.get_mut(&id) {
                        t.progress = new_progress;
                        t.trace_progress = new_trace_progress;
                        t.status = HackStatus::Complete;
                        t.compromise_expires_at_ms = Some(expires_at_ms);
                    }
                    messages.push((
                        trace.attacker_player_id.clone(),
                        ServerMessage::HackComplete {
                            hack_id: trace.id.clone(),
                            hack_type: trace.hack_type,
                            target_building_id: trace.target_building_id.clone(),
                        },
                    ));
                    if let Some(defender_id) = target_owner(session, &trace.target_building_id) {
                        messages.push((
                            defender_id,
                            ServerMessage::SystemCompromised {
                                building_id: trace.target_building_id.clone(),
                                hack_type: trace.hack_type,
                                expires_at_ms,
                            },
                        ));
                    }
                } else {
                    if let Some(t) = session.hacking_traces.get_mut(&id) {
                        t.progress = new_progress;
                        t.trace_progress = new_trace_progress;
                    }
                    if new_trace_progress > 0.0 && !was_traced_visible {
                        if let Some(defender_id) = target_owner(session, &trace.target_building_id) {
                            messages.push((
                                defender_id,
                                ServerMessage::IntrusionAlert {
                                    target_building_id: trace.target_building_id.clone(),
                                    trace_progress: new_trace_progress,
                                },
                            ));
                        }
                    }
                }
            }
            HackStatus::Complete => {
                if trace.compromise_expires_at_ms.is_some_and(|expiry| now_ms >= expiry) {
                    session.hacking_traces.remove(&id);
                }
            }
            HackStatus::Traced | HackStatus::Failed => {
                session.hacking_traces.remove(&id);
            }
        }
    }
    messages
}

fn attacker_origin(session: &GameSession, player_id: &str) -> GeoPos {
    session
        .players
        .get(player_id)
        .and_then(|p| p.territory_id.as_ref())
        .and_then(|territory_id| session.territories.get(territory_id))
        .and_then(|t| t.starting_positions.first().copied())
        .unwrap_or_default()
}

fn nearest_up_node(session: &GameSession, position: GeoPos) -> Option<String> {
    session
        .hacking_nodes
        .values()
        .filter(|n| n.up)
        .min_by(|a, b| {
            great_circle::distance_km(position, a.position)
                .total_cmp(&great_circle::distance_km(position, b.position))
        })
        .map(|n| n.id.clone())
}

fn route_is_valid(session: &GameSession, route: &[String]) -> bool {
    if route.is_empty() {
        return false;
    }
    if !route.iter().all(|id| session.hacking_nodes.get(id).is_some_and(|n| n.up)) {
        return false;
    }
    route.windows(2).all(|pair| {
        session.hacking_connections.iter().any(|c| {
            c.up
                && ((c.node_a == pair[0] && c.node_b == pair[1]) || (c.node_a == pair[1] && c.node_b == pair[0]))
        })
    })
}

fn shortest_path(session: &GameSession, source: &str, destination: &str) -> Option<Vec<String>> {
    if source == destination {
        return Some(vec![source.to_string()]);
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for c in &session.hacking_connections {
        if !c.up {
            continue;
        }
        adjacency.entry(&c.node_a).or_default().push(&c.node_b);
        adjacency.entry(&c.node_b).or_default().push(&c.node_a);
    }

    let mut visited: HashMap<&str, &str> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(source);
    visited.insert(source, source);

    while let Some(current) = queue.pop_front() {
        if current == destination {
            let mut path = vec![destination.to_string()];
            let mut cursor = destination;
            while cursor != source {
                cursor = visited[cursor];
                path.push(cursor.to_string());
            }
            path.reverse();
            return Some(path);
        }
        for &next in adjacency.get(current).into_iter().flatten() {
            if !visited.contains_key(next) {
                visited.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;
    use standoff_core::entities::{Building, BuildingCommon, HackingConnection, HackingNode};
    use standoff_core::enums::SessionPhase;

    fn session_with_network() -> GameSession {
        let mut session = GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase: SessionPhase::Escalation,
            defcon_level: 3,
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
        for (id, lon) in [("n1", 0.0), ("n2", 10.0), ("n3", 20.0)] {
            session.hacking_nodes.insert(
                id.into(),
                HackingNode { id: id.into(), position: GeoPos::new(0.0, lon), owner_id: None, up: true },
            );
        }
        session.hacking_connections.push(HackingConnection { node_a: "n1".into(), node_b: "n2".into(), up: true });
        session.hacking_connections.push(HackingConnection { node_a: "n2".into(), node_b: "n3".into(), up: true });

        session.buildings.insert(
            "radar-1".into(),
            Building::Radar {
                common: BuildingCommon {
                    id: "radar-1".into(),
                    owner_id: "defender".into(),
                    position: GeoPos::new(0.0, 20.0),
                    destroyed: false,
                },
                range_km: 1000.0,
                active: true,
            },
        );
        session
    }

    #[test]
    fn hack_start_auto_routes_across_the_network() {
        let mut session = session_with_network();
        let hack_id = hack_start(&mut session, "attacker", "radar-1", HackType::BlindRadar, None).unwrap();
        let trace = &session.hacking_traces[&hack_id];
        assert_eq!(trace.route_node_ids.last().unwrap(), "n3");
        assert!(trace.route_node_ids.len() >= 2);
    }

    #[test]
    fn hack_start_rejects_targeting_own_building() {
        let mut session = session_with_network();
        let result = hack_start(&mut session, "defender", "radar-1", HackType::BlindRadar, None);
        assert_eq!(result, Err(CommandError::CannotHackOwnBuilding));
    }

    #[test]
    fn completed_hack_is_visible_via_is_compromised_until_it_lapses() {
        let mut session = session_with_network();
        let catalog = Catalog::embedded();
        let hack_id = hack_start(&mut session, "attacker", "radar-1", HackType::BlindRadar, None).unwrap();

        for _ in 0..200 {
            step(&mut session, &catalog);
            if !session.hacking_traces.contains_key(&hack_id) {
                break;
            }
            if session
                .hacking_traces
                .get(&hack_id)
                .is_some_and(|t| t.status == HackStatus::Complete)
            {
                break;
            }
        }
        assert!(is_compromised(&session, "radar-1", HackType::BlindRadar));

        session.clock.timestamp_ms += HACK_COMPROMISE_DURATION_MS + 1;
        step(&mut session, &catalog);
        assert!(!is_compromised(&session, "radar-1", HackType::BlindRadar));
    }

    #[test]
    fn hack_purge_removes_traces_against_the_defenders_building() {
        let mut session = session_with_network();
        hack_start(&mut session, "attacker", "radar-1", HackType::BlindRadar, None).unwrap();
        let purged = hack_purge(&mut session, "defender", "radar-1").unwrap();
        assert_eq!(purged, 1);
        assert!(session.hacking_traces.is_empty());
    }

    #[test]
    fn step_reports_progress_to_the_attacker_and_completion_to_both_sides() {
        let mut session = session_with_network();
        let catalog = Catalog::embedded();
        let hack_id = hack_start(&mut session, "attacker", "radar-1", HackType::BlindRadar, None).unwrap();

        let first_tick = step(&mut session, &catalog);
        assert!(first_tick
            .iter()
            .any(|(to, msg)| to == "attacker" && matches!(msg, ServerMessage::HackProgress { hack_id: id, .. } if id == &hack_id)));

        let mut saw_complete = false;
        let mut saw_compromised = false;
        for _ in 0..200 {
            let messages = step(&mut session, &catalog);
            for (to, msg) in &messages {
                match msg {
                    ServerMessage::HackComplete { .. } if to == "attacker" => saw_complete = true,
                    ServerMessage::SystemCompromised { .. } if to == "defender" => saw_compromised = true,
                    _ => {}
                }
            }
            if saw_complete && saw_compromised {
                break;
            }
        }
        assert!(saw_complete, "expected the attacker to receive HackComplete");
        assert!(saw_compromised, "expected the defender to receive SystemCompromised");
    }
}
