//! Typed errors at each subsystem boundary (§7). No subsystem panics on
//! caller-controlled input; these are translated into the wire-level
//! `error`/`lobby_error` messages at the command boundary.

use thiserror::Error;

/// Errors raised while assembling or mutating a lobby (§4.2, §7 "Precondition").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LobbyError {
    #[error("lobby {0} not found")]
    NotFound(String),
    #[error("lobby is full")]
    Full,
    #[error("territory {0} is already taken")]
    TerritoryTaken(String),
    #[error("territory {0} does not exist")]
    UnknownTerritory(String),
    #[error("only the host can start the game")]
    NotHost,
    #[error("at least two players are required to start")]
    NotEnoughPlayers,
    #[error("all players must be ready and have a territory before starting")]
    NotAllReady,
    #[error("player is not a member of this lobby")]
    NotAMember,
}

/// Errors raised while processing an in-game command against a running
/// session (§4.10 authorization, §7 "Authorization"/"Precondition").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("game is not in a phase that permits this action")]
    WrongPhase,
    #[error("entity {0} not found")]
    UnknownEntity(String),
    #[error("player does not own entity {0}")]
    NotOwner(String),
    #[error("silo ammo exhausted")]
    AmmoExhausted,
    #[error("silo is not in attack mode")]
    WrongSiloMode,
    #[error("building capacity reached")]
    CapacityReached,
    #[error("cooldown still active")]
    CooldownActive,
    #[error("no feasible interception point exists")]
    NoInterceptSolution,
    #[error("hack already running against this target with an overlapping effect")]
    HackAlreadyRunning,
    #[error("a building's owner cannot target it with a hack")]
    CannotHackOwnBuilding,
    #[error("no route exists through the hacking network to this target")]
    NoRouteFound,
    #[error("invalid game speed")]
    InvalidGameSpeed,
    #[error("silo {0} is delayed by an active hack")]
    SiloDelayed(String),
}

/// Errors raised while parsing or validating an inbound wire message (§7 "Protocol").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("unknown message type")]
    UnknownType,
}
