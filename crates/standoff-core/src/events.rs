//! Events emitted by the simulation each tick, and the server→client
//! message envelope they travel in (§4.12, §6).

use serde::{Deserialize, Serialize};

use crate::entities::InterceptTarget;
use crate::types::GeoPos;

/// One fact that happened during a tick. Never retroactively amended —
/// late-joining observers get a full `game_state` snapshot instead (§4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    DefconChange {
        new_level: u8,
    },
    MissileLaunch {
        missile_id: String,
        owner_id: String,
        launch_geo: GeoPos,
        target_geo: GeoPos,
    },
    CityHit {
        city_id: String,
        population_lost: u64,
        attacker_id: String,
    },
    BuildingDestroyed {
        building_id: String,
        owner_id: String,
    },
    Interception {
        interceptor_id: String,
        target: InterceptTarget,
    },
    SatelliteLaunch {
        satellite_id: String,
        owner_id: String,
    },
    SatelliteDestroyed {
        satellite_id: String,
    },
    LaunchDetected {
        missile_id: String,
        approximate_geo: GeoPos,
    },
    GameEnd {
        winner_id: Option<String>,
    },
}

/// A server-pushed message outside the per-tick delta (lobby lifecycle,
/// errors, hacking feedback, ping/pong).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    LobbyList {
        lobbies: Vec<crate::state::LobbySummary>,
    },
    LobbyUpdate {
        lobby: crate::state::LobbySummary,
    },
    LobbyError {
        message: String,
    },
    GameStart {
        player_id: String,
        initial_state: crate::state::GameStateSnapshot,
    },
    GameState {
        state: crate::state::GameStateSnapshot,
    },
    GameDelta {
        delta: crate::state::GameDelta,
    },
    GameEnd {
        winner: Option<String>,
        scores: Vec<crate::state::ScoreEntry>,
    },
    Error {
        code: String,
        message: String,
    },

    HackScanResult {
        buildings: Vec<crate::state::ScanResult>,
    },
    HackProgress {
        hack_id: String,
        progress: f64,
    },
    HackComplete {
        hack_id: String,
        hack_type: crate::enums::HackType,
        target_building_id: String,
    },
    HackTraced {
        hack_id: String,
        attacker_id: String,
    },
    HackDisconnected {
        hack_id: String,
    },
    SystemCompromised {
        building_id: String,
        hack_type: crate::enums::HackType,
        expires_at_ms: u64,
    },
    IntrusionAlert {
        target_building_id: String,
        trace_progress: f64,
    },
    IntrusionStatus {
        traces: Vec<crate::state::TraceSummary>,
    },

    InterceptInfo {
        target: InterceptTarget,
        feasible: Vec<crate::state::InterceptFeasibility>,
    },

    Pong {
        client_time: u64,
        server_time: u64,
    },
}
