//! The tick orchestrator (§4.3, §4.12): drains queued client commands, steps
//! every subsystem in order, runs the AI, checks for game end, and builds
//! each player's delta for the tick just simulated.
//!
//! Grounded on `deterrence-app::game_loop`'s shape (drain input → step
//! systems → snapshot for observers) generalized from a single local player
//! to per-connection command queuing and per-recipient deltas.

use std::collections::{HashMap, VecDeque};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use standoff_ai::AiState;
use standoff_catalog::Catalog;
use standoff_core::commands::{ClientMessage, DebugCommand};
use standoff_core::constants::{GAME_SPEEDS, TICK_MS};
use standoff_core::entities::{Building, Missile, MissileCommon};
use standoff_core::enums::{MissileKind, SiloMode};
use standoff_core::error::CommandError;
use standoff_core::events::{ServerMessage, SimEvent};
use standoff_core::state::{GameDelta, GameSession, GameStateSnapshot, ScoreEntry};
use standoff_core::types::GeoPos;
use standoff_geo::{flight_profile, great_circle};

use crate::endgame;
use crate::systems::{ballistics, defcon, delta, hacking, launches, placement, satellites};

/// What one call to `SimulationEngine::tick` produced: a delta for every
/// player in the session, plus any direct replies owed to specific players
/// (command errors, scan results, pongs).
pub struct TickOutput {
    pub deltas: Vec<(String, GameDelta)>,
    pub replies: Vec<(String, ServerMessage)>,
}

/// Owns one running match: the authoritative `GameSession`, the seeded RNG
/// that makes its outcomes reproducible, and the per-player scratch state
/// needed between ticks (AI memory, delta caches).
pub struct SimulationEngine {
    session: GameSession,
    catalog: Catalog,
    rng: ChaCha8Rng,
    ai_states: HashMap<String, AiState>,
    delta_cache: delta::DeltaCache,
    command_queue: VecDeque<(String, ClientMessage)>,
}

impl SimulationEngine {
    pub fn new(session: GameSession, catalog: Catalog, seed: u64) -> Self {
        Self {
            session,
            catalog,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ai_states: HashMap::new(),
            delta_cache: delta::DeltaCache::new(),
            command_queue: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Queue a command for processing at the next tick boundary (§6: commands
    /// apply between ticks, never mid-tick).
    pub fn enqueue(&mut self, player_id: String, message: ClientMessage) {
        self.command_queue.push_back((player_id, message));
    }

    /// A newly joined or reconnected observer's full state (§4.12).
    pub fn snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            tick: self.session.clock.tick,
            timestamp_ms: self.session.clock.timestamp_ms,
            phase: self.session.phase,
            defcon_level: self.session.defcon_level,
            defcon_ms_remaining: self.session.defcon_ms_remaining,
            game_speed: self.session.game_speed,
            players: self.session.players.values().cloned().collect(),
            territories: self.session.territories.values().cloned().collect(),
            cities: self.session.cities.values().cloned().collect(),
            buildings: self.session.buildings.values().cloned().collect(),
            missiles: self.session.missiles.values().cloned().collect(),
            satellites: self.session.satellites.values().cloned().collect(),
        }
    }

    pub fn final_scores(&self) -> Vec<ScoreEntry> {
        endgame::final_scores(&self.session)
    }

    /// Drop a departed player's delta cache and AI memory; their entities
    /// stay in the session (disconnection doesn't remove buildings/missiles).
    pub fn forget_player(&mut self, player_id: &str) {
        self.delta_cache.forget_player(player_id);
        self.ai_states.remove(player_id);
    }

    /// Run one simulation tick: advance DEFCON, then drain queued commands
    /// (placement/launch gates see the already-advanced phase), then step
    /// the remaining subsystems, and build the per-player deltas for what
    /// changed (§4.3's "advance(dt) → DEFCON → placement → launch →
    /// ballistics → …" order).
    pub fn tick(&mut self) -> TickOutput {
        let dt_ms = TICK_MS * self.session.game_speed as u64;
        let mut events = Vec::new();
        let mut replies = Vec::new();

        defcon::step(&mut self.session, dt_ms, &mut events);

        self.drain_commands(&mut events, &mut replies);

        ballistics::step(&mut self.session, dt_ms, &mut self.rng, &mut events);
        satellites::step(&mut self.session);
        replies.extend(hacking::step(&mut self.session, &self.catalog));
        events.extend(standoff_ai::controller::run(
            &mut self.session,
            &self.catalog,
            &mut self.rng,
            &mut self.ai_states,
        ));
        endgame::check(&mut self.session, &mut events);

        self.session.clock.advance(dt_ms);

        let deltas = self
            .session
            .player_ids()
            .into_iter()
            .map(|player_id| {
                let player_delta = delta::build_delta(&self.session, &player_id, &events, &mut self.delta_cache);
                (player_id, player_delta)
            })
            .collect();

        TickOutput { deltas, replies }
    }

    fn drain_commands(&mut self, events: &mut Vec<SimEvent>, replies: &mut Vec<(String, ServerMessage)>) {
        while let Some((player_id, message)) = self.command_queue.pop_front() {
            self.handle_command(&player_id, message, events, replies);
        }
    }

    fn handle_command(
        &mut self,
        player_id: &str,
        message: ClientMessage,
        events: &mut Vec<SimEvent>,
        replies: &mut Vec<(String, ServerMessage)>,
    ) {
        match message {
            ClientMessage::PlaceBuilding { building_type, position } => {
                if let Err(e) = placement::place_building(&mut self.session, player_id, building_type, position) {
                    replies.push((player_id.to_string(), error_reply(e)));
                }
            }
            ClientMessage::LaunchMissile { silo_id, target_position, .. } => {
                match launches::launch_missile(&mut self.session, player_id, &silo_id, target_position) {
                    Ok(event) => events.push(event),
                    Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                }
            }
            ClientMessage::SetSiloMode { silo_id, mode } => {
                if let Err(e) = set_silo_mode(&mut self.session, player_id, &silo_id, mode) {
                    replies.push((player_id.to_string(), error_reply(e)));
                }
            }
            ClientMessage::LaunchSatellite { facility_id, inclination } => {
                match satellites::launch_satellite(&mut self.session, player_id, &facility_id, inclination) {
                    Ok(event) => events.push(event),
                    Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                }
            }
            ClientMessage::SetGameSpeed { speed } => {
                if GAME_SPEEDS.contains(&speed) {
                    self.session.game_speed = speed;
                } else {
                    replies.push((player_id.to_string(), error_reply(CommandError::InvalidGameSpeed)));
                }
            }
            ClientMessage::HackScan => {
                let buildings = hacking::hack_scan(&self.session, player_id);
                replies.push((player_id.to_string(), ServerMessage::HackScanResult { buildings }));
            }
            ClientMessage::HackStart { target_building_id, hack_type, route } => {
                match hacking::hack_start(&mut self.session, player_id, &target_building_id, hack_type, route) {
                    Ok(_hack_id) => {}
                    Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                }
            }
            ClientMessage::HackDisconnect { hack_id } => {
                match hacking::hack_disconnect(&mut self.session, player_id, &hack_id) {
                    Ok(()) => replies.push((player_id.to_string(), ServerMessage::HackDisconnected { hack_id })),
                    Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                }
            }
            ClientMessage::HackPurge { target_building_id } => {
                if let Err(e) = hacking::hack_purge(&mut self.session, player_id, &target_building_id) {
                    replies.push((player_id.to_string(), error_reply(e)));
                }
            }
            ClientMessage::HackTrace => {
                let traces = hacking::hack_trace(&self.session, player_id);
                replies.push((player_id.to_string(), ServerMessage::IntrusionStatus { traces }));
            }
            ClientMessage::RequestInterceptInfo { target } => {
                match launches::request_intercept_info(&self.session, player_id, &target) {
                    Ok(feasible) => {
                        replies.push((player_id.to_string(), ServerMessage::InterceptInfo { target, feasible }))
                    }
                    Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                }
            }
            ClientMessage::ManualIntercept { target, silo_ids } => {
                for result in launches::manual_intercept(&mut self.session, player_id, &target, &silo_ids) {
                    match result {
                        Ok(event) => events.push(event),
                        Err(e) => replies.push((player_id.to_string(), error_reply(e))),
                    }
                }
            }
            ClientMessage::RequestGameState => {
                replies.push((player_id.to_string(), ServerMessage::GameState { state: self.snapshot() }));
            }
            ClientMessage::Debug { command } => self.handle_debug(command, events),
            ClientMessage::EnableAi { region } => self.set_ai_controlled(player_id, region.as_deref(), true),
            ClientMessage::DisableAi { region } => self.set_ai_controlled(player_id, region.as_deref(), false),
            ClientMessage::Ping { client_time } => {
                replies.push((
                    player_id.to_string(),
                    ServerMessage::Pong { client_time, server_time: self.session.clock.timestamp_ms },
                ));
            }
            // Lobby lifecycle messages are handled by the lobby manager before a
            // session exists; a running session ignores them.
            ClientMessage::CreateLobby { .. }
            | ClientMessage::JoinLobby { .. }
            | ClientMessage::LeaveLobby
            | ClientMessage::SetReady { .. }
            | ClientMessage::SelectTerritory { .. }
            | ClientMessage::StartGame => {}
        }
    }

    fn handle_debug(&mut self, command: DebugCommand, events: &mut Vec<SimEvent>) {
        match command {
            DebugCommand::AdvanceDefcon => defcon::force_advance(&mut self.session, events),
            DebugCommand::SetDefcon { level } => defcon::force_set(&mut self.session, level, events),
            DebugCommand::SkipTimer => defcon::skip_timer(&mut self.session),
            DebugCommand::AddMissiles { silo_id, amount } => {
                if let Some(Building::Silo { missile_ammo, .. }) = self.session.buildings.get_mut(&silo_id) {
                    *missile_ammo += amount;
                }
            }
            DebugCommand::LaunchTestMissiles { target_region, count } => {
                self.spawn_test_missiles(target_region.as_deref(), count);
            }
        }
    }

    /// A target a human could toggle AI control over: either a named
    /// territory's owner, or (no region given) the caller's own seat.
    fn set_ai_controlled(&mut self, player_id: &str, region: Option<&str>, is_ai: bool) {
        let target_id = match region {
            Some(territory_id) => {
                let Some(owner_id) = self.session.territories.get(territory_id).and_then(|t| t.owner_id.clone())
                else {
                    return;
                };
                owner_id
            }
            None => player_id.to_string(),
        };

        if let Some(player) = self.session.players.get_mut(&target_id) {
            player.is_ai = is_ai;
        }
        if is_ai {
            self.ai_states.entry(target_id).or_default();
        } else {
            self.ai_states.remove(&target_id);
        }
    }

    fn spawn_test_missiles(&mut self, target_region: Option<&str>, count: u32) {
        let target_geo = target_region
            .and_then(|id| self.session.territories.get(id))
            .and_then(|t| t.starting_positions.first().copied())
            .unwrap_or_default();

        let Some(source_geo) = self
            .session
            .buildings
            .values()
            .find(|b| matches!(b, Building::Silo { .. }))
            .map(|b| b.common().position)
        else {
            return;
        };

        for i in 0..count {
            let jittered_target =
                GeoPos::new(target_geo.lat + self.rng.gen_range(-2.0..=2.0), target_geo.lon + self.rng.gen_range(-2.0..=2.0));
            let distance_km = great_circle::distance_km(source_geo, jittered_target);
            let missile_id = format!("debug-icbm-{}-{i}", self.session.clock.tick);
            let common = MissileCommon {
                id: missile_id.clone(),
                owner_id: "debug".to_string(),
                kind: MissileKind::Icbm,
                launch_geo: source_geo,
                target_geo: jittered_target,
                current_geo: source_geo,
                launch_tick: self.session.clock.tick,
                flight_duration_ms: flight_profile::flight_duration_ms(distance_km),
                apex_altitude_m: flight_profile::apex_altitude_m(distance_km),
                progress: 0.0,
                intercepted: false,
                detonated: false,
            };
            self.session.missiles.insert(
                missile_id.clone(),
                Missile::Icbm { common, source_silo_id: "debug".to_string() },
            );
        }
    }
}

fn set_silo_mode(session: &mut GameSession, player_id: &str, silo_id: &str, mode: SiloMode) -> Result<(), CommandError> {
    let silo = session.buildings.get_mut(silo_id).ok_or_else(|| CommandError::UnknownEntity(silo_id.to_string()))?;
    if silo.owner_id() != player_id {
        return Err(CommandError::NotOwner(silo_id.to_string()));
    }
    match silo {
        Building::Silo { mode: current, .. } => {
            *current = mode;
            Ok(())
        }
        _ => Err(CommandError::WrongSiloMode),
    }
}

fn error_reply(err: CommandError) -> ServerMessage {
    ServerMessage::Error { code: format!("{err:?}"), message: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_setup::{build_session, SessionMember};
    use standoff_core::commands::PlaceableBuildingType;

    fn engine_with_one_player() -> SimulationEngine {
        let catalog = Catalog::embedded();
        let territory_id = catalog.territories[0].id.clone();
        let members = vec![SessionMember {
            player_id: "p1".into(),
            name: "Alice".into(),
            territory_id,
            is_ai: false,
        }];
        let session = build_session("sess-1".into(), &catalog, Default::default(), &members);
        SimulationEngine::new(session, catalog, 1)
    }

    #[test]
    fn placement_command_is_applied_on_next_tick() {
        let mut engine = engine_with_one_player();
        engine.enqueue(
            "p1".into(),
            ClientMessage::PlaceBuilding { building_type: PlaceableBuildingType::Silo, position: GeoPos::new(0.0, 0.0) },
        );
        let output = engine.tick();
        assert_eq!(engine.session().buildings.len(), 1);
        assert!(output.deltas.iter().any(|(id, d)| id == "p1" && !d.building_updates.is_empty()));
    }

    #[test]
    fn invalid_game_speed_produces_an_error_reply() {
        let mut engine = engine_with_one_player();
        engine.enqueue("p1".into(), ClientMessage::SetGameSpeed { speed: 3 });
        let output = engine.tick();
        assert!(output.replies.iter().any(|(id, msg)| id == "p1" && matches!(msg, ServerMessage::Error { .. })));
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let mut engine = engine_with_one_player();
        engine.enqueue("p1".into(), ClientMessage::Ping { client_time: 42 });
        let output = engine.tick();
        assert!(output
            .replies
            .iter()
            .any(|(id, msg)| id == "p1" && matches!(msg, ServerMessage::Pong { client_time: 42, .. })));
    }
}
