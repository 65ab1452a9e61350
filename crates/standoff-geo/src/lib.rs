//! Great-circle geometry and ICBM flight-profile math (§4.5).
//!
//! Kept separate from `standoff-sim` because it's pure, deterministic, and
//! useful on its own — no session state, no RNG.

pub mod flight_profile;
pub mod great_circle;
