//! Per-recipient delta assembly (§4.12): fog-filtered, diffed against each
//! player's own previously-sent snapshot so an unchanged entity costs
//! nothing on the wire.
//!
//! Diffing compares serialized JSON values rather than requiring every
//! entity type to implement `PartialEq` — cheap enough at this scale and
//! one less trait bound to thread through `standoff-core`.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use serde_json::Value;

use standoff_core::constants::LAUNCH_DETECTION_JITTER_DEG;
use standoff_core::events::SimEvent;
use standoff_core::state::{GameDelta, GameSession};
use standoff_core::types::GeoPos;

use super::fog;

#[derive(Debug, Default)]
pub struct DeltaCache {
    buildings: HashMap<String, HashMap<String, Value>>,
    missiles: HashMap<String, HashMap<String, Value>>,
    satellites: HashMap<String, HashMap<String, Value>>,
}

impl DeltaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached state for a player who has left the session.
    pub fn forget_player(&mut self, player_id: &str) {
        self.buildings.remove(player_id);
        self.missiles.remove(player_id);
        self.satellites.remove(player_id);
    }
}

/// A deterministic, id-derived jitter applied to a launch position reported
/// to a recipient with no track on the missile yet — stable across ticks so
/// the coarse marker doesn't visibly teleport (§4.8).
fn jittered_geo(missile_id: &str, geo: GeoPos) -> GeoPos {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    missile_id.hash(&mut hasher);
    let hash = hasher.finish();
    let unit = |bits: u64| (bits & 0xFFFF) as f64 / 0xFFFF as f64 - 0.5;
    let lat_jitter = unit(hash) * LAUNCH_DETECTION_JITTER_DEG;
    let lon_jitter = unit(hash >> 16) * LAUNCH_DETECTION_JITTER_DEG;
    GeoPos::new(geo.lat + lat_jitter, geo.lon + lon_jitter)
}

/// Build the delta `player_id` should receive for the tick just simulated.
pub fn build_delta(session: &GameSession, player_id: &str, events: &[SimEvent], cache: &mut DeltaCache) -> GameDelta {
    let visibility = fog::visible_for(session, player_id);
    let mut delta = GameDelta::empty(session.clock.tick, session.clock.timestamp_ms);
    delta.events = events
        .iter()
        .map(|event| match event {
            SimEvent::MissileLaunch { missile_id, owner_id, launch_geo, .. }
                if owner_id != player_id && !visibility.missiles.contains(missile_id) =>
            {
                SimEvent::LaunchDetected {
                    missile_id: missile_id.clone(),
                    approximate_geo: jittered_geo(missile_id, *launch_geo),
                }
            }
            other => other.clone(),
        })
        .collect();

    let building_cache = cache.buildings.entry(player_id.to_string()).or_default();
    let mut seen = HashSet::new();
    for id in &visibility.buildings {
        let Some(building) = session.buildings.get(id) else { continue };
        seen.insert(id.clone());
        let value = serde_json::to_value(building).expect("Building serializes");
        if building_cache.get(id) != Some(&value) {
            delta.building_updates.push(building.clone());
            building_cache.insert(id.clone(), value);
        }
    }
    building_cache.retain(|id, _| seen.contains(id));

    let missile_cache = cache.missiles.entry(player_id.to_string()).or_default();
    let mut seen = HashSet::new();
    for id in &visibility.missiles {
        let Some(missile) = session.missiles.get(id) else { continue };
        seen.insert(id.clone());
        let value = serde_json::to_value(missile).expect("Missile serializes");
        if missile_cache.get(id) != Some(&value) {
            delta.missile_updates.push(missile.clone());
            missile_cache.insert(id.clone(), value);
        }
    }
    let removed_missile_ids: Vec<String> =
        missile_cache.keys().filter(|id| !seen.contains(*id)).cloned().collect();
    for id in &removed_missile_ids {
        missile_cache.remove(id);
    }
    delta.removed_missile_ids = removed_missile_ids;

    // Satellites are never fog-gated (§4.8): every recipient sees every one.
    let satellite_cache = cache.satellites.entry(player_id.to_string()).or_default();
    let mut seen = HashSet::new();
    for (id, satellite) in &session.satellites {
        seen.insert(id.clone());
        let value = serde_json::to_value(satellite).expect("Satellite serializes");
        if satellite_cache.get(id) != Some(&value) {
            delta.satellite_updates.push(satellite.clone());
            satellite_cache.insert(id.clone(), value);
        }
    }
    let removed_satellite_ids: Vec<String> =
        satellite_cache.keys().filter(|id| !seen.contains(*id)).cloned().collect();
    for id in &removed_satellite_ids {
        satellite_cache.remove(id);
    }
    delta.removed_satellite_ids = removed_satellite_ids;

    delta
}
