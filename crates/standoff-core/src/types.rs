//! Fundamental geometric and simulation types.

use serde::{Deserialize, Serialize};

/// A geographic position in degrees. Territories are opaque named regions;
/// this is the only coordinate system the simulation core understands —
/// map rendering, coastlines, and country polygons are the presentation
/// client's problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Simulation clock: tick count plus wall-clock-equivalent milliseconds
/// since session start (affected by `game_speed`, see `GameSession::advance`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimClock {
    pub tick: u64,
    pub timestamp_ms: u64,
}

impl SimClock {
    /// Advance by one tick at the given dt (milliseconds, already scaled by game speed).
    pub fn advance(&mut self, dt_ms: u64) {
        self.tick += 1;
        self.timestamp_ms += dt_ms;
    }
}
