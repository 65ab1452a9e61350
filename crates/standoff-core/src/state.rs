//! Aggregate state: `GameSession` (§3's aggregate root), the full snapshot
//! sent to late joiners, and the incremental per-tick delta (§4.12).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::entities::{
    Building, City, HackingConnection, HackingNode, HackingTrace, Missile, Player, Satellite,
    Territory,
};
use crate::enums::{HackType, SessionPhase};
use crate::events::SimEvent;
use crate::types::{GeoPos, SimClock};

/// The aggregate root for one running match. A single `GameSession`
/// exclusively owns its world; entities never cross sessions (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub clock: SimClock,
    pub phase: SessionPhase,
    pub defcon_level: u8,
    pub defcon_ms_remaining: u64,
    pub game_speed: u32,

    pub players: HashMap<String, Player>,
    pub territories: HashMap<String, Territory>,
    pub cities: HashMap<String, City>,
    pub buildings: HashMap<String, Building>,
    pub missiles: HashMap<String, Missile>,
    pub satellites: HashMap<String, Satellite>,

    pub hacking_nodes: HashMap<String, HackingNode>,
    pub hacking_connections: Vec<HackingConnection>,
    pub hacking_traces: HashMap<String, HackingTrace>,

    pub config: SessionConfig,
}

impl GameSession {
    /// Player ids ordered by join order is not tracked here (HashMap); the
    /// server layer keeps a lobby member list for display ordering.
    pub fn player_ids(&self) -> Vec<String> {
        self.players.keys().cloned().collect()
    }

    pub fn silo_owner(&self, silo_id: &str) -> Option<&str> {
        self.buildings.get(silo_id).map(|b| b.owner_id())
    }
}

/// Complete state sent to a newly joined/reconnected observer (§4.12).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub phase: SessionPhase,
    pub defcon_level: u8,
    pub defcon_ms_remaining: u64,
    pub game_speed: u32,
    pub players: Vec<Player>,
    pub territories: Vec<Territory>,
    pub cities: Vec<City>,
    pub buildings: Vec<Building>,
    pub missiles: Vec<Missile>,
    pub satellites: Vec<Satellite>,
}

/// Per-recipient incremental update for one tick (§4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDelta {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub events: Vec<SimEvent>,
    pub building_updates: Vec<Building>,
    pub missile_updates: Vec<Missile>,
    pub removed_missile_ids: Vec<String>,
    pub satellite_updates: Vec<Satellite>,
    pub removed_satellite_ids: Vec<String>,
}

impl GameDelta {
    pub fn empty(tick: u64, timestamp_ms: u64) -> Self {
        Self {
            tick,
            timestamp_ms,
            events: Vec::new(),
            building_updates: Vec::new(),
            missile_updates: Vec::new(),
            removed_missile_ids: Vec::new(),
            satellite_updates: Vec::new(),
            removed_satellite_ids: Vec::new(),
        }
    }

    /// Whether sending this delta would convey nothing to the recipient.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
            && self.building_updates.is_empty()
            && self.missile_updates.is_empty()
            && self.removed_missile_ids.is_empty()
            && self.satellite_updates.is_empty()
            && self.removed_satellite_ids.is_empty()
    }
}

/// A lobby as presented to clients (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbySummary {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub members: Vec<LobbyMemberSummary>,
    pub available_territories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyMemberSummary {
    pub player_id: String,
    pub name: String,
    pub ready: bool,
    pub territory_id: Option<String>,
}

/// Final per-player score line in `game_end` (§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player_id: String,
    pub score: i64,
    pub enemy_kills: u32,
    pub population_remaining: u64,
}

/// One building revealed by a `hack_scan` (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub building_id: String,
    pub owner_id: String,
    pub position: GeoPos,
    pub kind: String,
}

/// A hacking trace as reported to its defender (§4.7 `hack_trace`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub hack_id: String,
    pub target_building_id: String,
    pub hack_type: HackType,
    pub progress: f64,
    pub trace_progress: f64,
    /// Only populated once the trace itself has progressed enough to reveal
    /// the attacker (`traceProgress > 0`, §4.7).
    pub attacker_id: Option<String>,
}

/// One candidate silo for `request_intercept_info` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptFeasibility {
    pub silo_id: String,
    pub feasible: bool,
    pub estimated_hit_probability: f64,
}
