//! The data model (§3): players, territories, cities, buildings, missiles,
//! satellites, and the hacking graph.
//!
//! Polymorphic entities (buildings, missiles) are tagged variants with a
//! shared common-field struct rather than an inheritance hierarchy, per
//! spec.md §9's design note. Subsystems dispatch on the tag.

use serde::{Deserialize, Serialize};

use crate::enums::{HackStatus, HackType, InterceptorStatus, MissileKind, SiloMode};
use crate::types::GeoPos;

/// A connected human or AI participant. Created on lobby join, destroyed
/// with the session (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub territory_id: Option<String>,
    pub population_remaining: u64,
    pub population_lost: u64,
    pub enemy_kills: u32,
    pub score: i64,
    pub is_ai: bool,
    pub ready: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_ai: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            territory_id: None,
            population_remaining: 0,
            population_lost: 0,
            enemy_kills: 0,
            score: 0,
            is_ai,
            ready: is_ai,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.population_remaining > 0
    }
}

/// Static catalog entry plus a mutable owner, set when a player selects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub name: String,
    pub boundary_polygon: Vec<GeoPos>,
    pub city_ids: Vec<String>,
    pub starting_positions: Vec<GeoPos>,
    pub owner_id: Option<String>,
}

/// A populated place within a territory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub territory_id: String,
    pub geo_position: GeoPos,
    pub population: u64,
    pub max_population: u64,
    pub destroyed: bool,
}

impl City {
    /// Apply a population loss, flooring at zero and flagging destruction.
    pub fn apply_losses(&mut self, amount: u64) -> u64 {
        let actual = amount.min(self.population);
        self.population -= actual;
        if self.population == 0 {
            self.destroyed = true;
        }
        actual
    }
}

/// Fields shared by every building variant (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingCommon {
    pub id: String,
    pub owner_id: String,
    pub position: GeoPos,
    pub destroyed: bool,
}

/// A player-owned structure. Placement is only permitted at DEFCON 5 (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Building {
    Silo {
        common: BuildingCommon,
        mode: SiloMode,
        missile_ammo: u32,
        interceptor_ammo: u32,
        last_fire_time_ms: u64,
    },
    Radar {
        common: BuildingCommon,
        range_km: f64,
        active: bool,
    },
    Airfield {
        common: BuildingCommon,
        fighter_ammo: u32,
        bomber_ammo: u32,
    },
    SatelliteFacility {
        common: BuildingCommon,
        satellite_stock: u32,
        launch_cooldown_ms: u64,
        last_launch_time_ms: u64,
    },
}

impl Building {
    pub fn common(&self) -> &BuildingCommon {
        match self {
            Building::Silo { common, .. }
            | Building::Radar { common, .. }
            | Building::Airfield { common, .. }
            | Building::SatelliteFacility { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut BuildingCommon {
        match self {
            Building::Silo { common, .. }
            | Building::Radar { common, .. }
            | Building::Airfield { common, .. }
            | Building::SatelliteFacility { common, .. } => common,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn owner_id(&self) -> &str {
        &self.common().owner_id
    }

    pub fn destroyed(&self) -> bool {
        self.common().destroyed
    }

    /// Kind name used for display/debug (not the wire tag, which serde emits directly).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Building::Silo { .. } => "silo",
            Building::Radar { .. } => "radar",
            Building::Airfield { .. } => "airfield",
            Building::SatelliteFacility { .. } => "satellite_facility",
        }
    }
}

/// Fields shared by every missile variant (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissileCommon {
    pub id: String,
    pub owner_id: String,
    pub kind: MissileKind,
    pub launch_geo: GeoPos,
    pub target_geo: GeoPos,
    pub current_geo: GeoPos,
    pub launch_tick: u64,
    pub flight_duration_ms: u64,
    pub apex_altitude_m: f64,
    pub progress: f64,
    pub intercepted: bool,
    pub detonated: bool,
}

/// What a launched interceptor, or an intercept-feasibility query, is aimed
/// at: an in-flight ICBM, or a satellite once it's in orbit (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterceptTarget {
    Missile { id: String },
    Satellite { id: String },
}

impl InterceptTarget {
    pub fn id(&self) -> &str {
        match self {
            InterceptTarget::Missile { id } | InterceptTarget::Satellite { id } => id,
        }
    }
}

/// A ballistic weapon in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Missile {
    Icbm {
        common: MissileCommon,
        source_silo_id: String,
    },
    Interceptor {
        common: MissileCommon,
        source_silo_id: String,
        target: InterceptTarget,
        rail_start_geo: GeoPos,
        rail_end_geo: GeoPos,
        rail_end_altitude_m: f64,
        fuel_seconds: f64,
        tracking_radar_ids: Vec<String>,
        has_guidance: bool,
        status: InterceptorStatus,
        miss_behavior: Option<String>,
        /// Ticks elapsed since guidance was last confirmed (drives the grace period).
        ticks_without_guidance: u32,
        /// Ticks elapsed since entering the post-miss coast (§4.5).
        coast_ticks: u32,
    },
}

impl Missile {
    pub fn common(&self) -> &MissileCommon {
        match self {
            Missile::Icbm { common, .. } | Missile::Interceptor { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut MissileCommon {
        match self {
            Missile::Icbm { common, .. } | Missile::Interceptor { common, .. } => common,
        }
    }

    pub fn id(&self) -> &str {
        &self.common().id
    }

    pub fn owner_id(&self) -> &str {
        &self.common().owner_id
    }

    /// Whether this missile should be removed at the end of the current tick (§3 invariant).
    pub fn is_resolved(&self) -> bool {
        let c = self.common();
        c.intercepted || c.detonated
    }
}

/// A satellite launched from a `SatelliteFacility`. Persists unless destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Satellite {
    pub id: String,
    pub owner_id: String,
    pub source_facility_id: String,
    pub launch_epoch_ms: u64,
    pub orbital_period_ms: u64,
    pub orbital_altitude_km: f64,
    pub inclination_deg: f64,
    pub starting_longitude_deg: f64,
    pub destroyed: bool,
    pub health: f64,
    /// Derived each tick; cached here so the delta builder can diff cheaply.
    pub progress: f64,
    pub ground_position: GeoPos,
}

/// A node in the static hacking network graph (data centre or cable landing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackingNode {
    pub id: String,
    pub position: GeoPos,
    pub owner_id: Option<String>,
    pub up: bool,
}

/// A bidirectional link between two hacking nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackingConnection {
    pub node_a: String,
    pub node_b: String,
    pub up: bool,
}

/// An active or resolved hacking attempt against a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackingTrace {
    pub id: String,
    pub attacker_player_id: String,
    pub target_building_id: String,
    pub hack_type: HackType,
    pub progress: f64,
    pub trace_progress: f64,
    pub status: HackStatus,
    pub route_node_ids: Vec<String>,
    /// When the compromise effect (if completed) expires, in session timestamp ms.
    pub compromise_expires_at_ms: Option<u64>,
}
