//! Messages sent from clients to the server (§6).
//!
//! Validated and queued for processing at the next tick boundary for
//! in-game commands; lobby commands are handled immediately by the lobby
//! manager since they don't touch a running simulation.

use serde::{Deserialize, Serialize};

use crate::config::PartialSessionConfig;
use crate::entities::InterceptTarget;
use crate::types::GeoPos;

/// Debug commands, restricted to sessions/servers that enable them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DebugCommand {
    AdvanceDefcon,
    SetDefcon { level: u8 },
    SkipTimer,
    AddMissiles { silo_id: String, amount: u32 },
    LaunchTestMissiles {
        target_region: Option<String>,
        count: u32,
    },
}

/// What kind of building a `place_building` command is requesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceableBuildingType {
    Silo,
    Radar,
    Airfield,
    SatelliteFacility,
}

/// All messages a connected client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    CreateLobby {
        player_name: String,
        lobby_name: String,
        config: Option<PartialSessionConfig>,
    },
    JoinLobby {
        lobby_id: String,
        player_name: String,
    },
    LeaveLobby,
    SetReady {
        ready: bool,
    },
    SelectTerritory {
        territory_id: String,
    },
    StartGame,

    PlaceBuilding {
        building_type: PlaceableBuildingType,
        position: GeoPos,
    },
    LaunchMissile {
        silo_id: String,
        target_position: GeoPos,
        target_id: Option<String>,
    },
    SetSiloMode {
        silo_id: String,
        mode: crate::enums::SiloMode,
    },
    LaunchSatellite {
        facility_id: String,
        inclination: f64,
    },
    SetGameSpeed {
        speed: u32,
    },

    HackScan,
    HackStart {
        target_building_id: String,
        hack_type: crate::enums::HackType,
        route: Option<Vec<String>>,
    },
    HackDisconnect {
        hack_id: String,
    },
    HackPurge {
        target_building_id: String,
    },
    HackTrace,

    RequestInterceptInfo {
        target: InterceptTarget,
    },
    ManualIntercept {
        target: InterceptTarget,
        silo_ids: Vec<String>,
    },

    Debug {
        command: DebugCommand,
    },
    EnableAi {
        region: Option<String>,
    },
    DisableAi {
        region: Option<String>,
    },

    Ping {
        client_time: u64,
    },

    RequestGameState,
}
