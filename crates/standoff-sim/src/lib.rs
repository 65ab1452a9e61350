//! The authoritative simulation (§3, §4): session construction, the per-tick
//! systems, end-of-game scoring, and the `SimulationEngine` that orchestrates
//! them. `standoff-server` is the only intended caller — everything here
//! operates on an in-process `GameSession`, with no networking concerns.

pub mod endgame;
pub mod engine;
pub mod session_setup;
pub mod systems;

pub use engine::{SimulationEngine, TickOutput};
