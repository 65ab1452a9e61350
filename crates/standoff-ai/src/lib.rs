//! Scripted AI opponent (§4.9): placement, mode flips, population-weighted
//! salvos, each gated by the session's current DEFCON phase.

pub mod controller;
pub mod profiles;

pub use controller::AiState;
