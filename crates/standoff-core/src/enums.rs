//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Top-level session phase. Transitions only move forward (§4.4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Placement,
    Escalation,
    Launch,
    Ended,
}

/// Silo operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiloMode {
    #[default]
    Defend,
    Attack,
}

/// Missile kind tag. Kept as an explicit field (rather than relying solely on
/// the enum discriminant) because the wire protocol mirrors §3's data model
/// field-for-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissileKind {
    Icbm,
    Interceptor,
}

/// Interceptor flight status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterceptorStatus {
    #[default]
    Active,
    Missed,
    Hit,
    Crashed,
}

/// Hack effect type. The progress/trace-per-tick curves for each are loaded
/// from the catalog configuration document (they are "considered external"
/// per spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HackType {
    BlindRadar,
    DelaySilo,
    RevealTarget,
    DisableSatelliteComm,
}

/// Hacking trace lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HackStatus {
    #[default]
    Routing,
    Active,
    Complete,
    Traced,
    Failed,
}
