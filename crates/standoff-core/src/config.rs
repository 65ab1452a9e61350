//! Session configuration: the tunables a lobby host may override at
//! `create_lobby` time, resolved against server defaults into a full
//! `SessionConfig` when the lobby starts (§4.2, §4.3).

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Fields a lobby host may supply; anything left `None` falls back to the
/// server default in `SessionConfig::resolve`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSessionConfig {
    pub max_players: Option<u32>,
    pub defcon5_secs: Option<u64>,
    pub defcon_escalation_secs: Option<u64>,
    pub defcon1_secs: Option<u64>,
    pub max_silos_per_player: Option<u32>,
    pub starting_missile_ammo: Option<u32>,
    pub starting_interceptor_ammo: Option<u32>,
    pub ai_enabled: Option<bool>,
}

/// The fully-resolved configuration a `GameSession` is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub max_players: u32,
    pub defcon5_secs: u64,
    pub defcon_escalation_secs: u64,
    pub defcon1_secs: u64,
    pub max_silos_per_player: u32,
    pub starting_missile_ammo: u32,
    pub starting_interceptor_ammo: u32,
    pub ai_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            defcon5_secs: DEFAULT_DEFCON5_SECS,
            defcon_escalation_secs: DEFAULT_DEFCON_ESCALATION_SECS,
            defcon1_secs: DEFAULT_DEFCON1_SECS,
            max_silos_per_player: MAX_SILOS_PER_PLAYER,
            starting_missile_ammo: STARTING_MISSILE_AMMO,
            starting_interceptor_ammo: STARTING_INTERCEPTOR_AMMO,
            ai_enabled: true,
        }
    }
}

impl SessionConfig {
    /// Resolve a host-supplied partial config against the server defaults.
    pub fn resolve(partial: Option<&PartialSessionConfig>) -> Self {
        let default = Self::default();
        let Some(p) = partial else { return default };
        Self {
            max_players: p.max_players.unwrap_or(default.max_players),
            defcon5_secs: p.defcon5_secs.unwrap_or(default.defcon5_secs),
            defcon_escalation_secs: p
                .defcon_escalation_secs
                .unwrap_or(default.defcon_escalation_secs),
            defcon1_secs: p.defcon1_secs.unwrap_or(default.defcon1_secs),
            max_silos_per_player: p
                .max_silos_per_player
                .unwrap_or(default.max_silos_per_player),
            starting_missile_ammo: p
                .starting_missile_ammo
                .unwrap_or(default.starting_missile_ammo),
            starting_interceptor_ammo: p
                .starting_interceptor_ammo
                .unwrap_or(default.starting_interceptor_ammo),
            ai_enabled: p.ai_enabled.unwrap_or(default.ai_enabled),
        }
    }

    /// Duration, in seconds, of the DEFCON timer for the given level. Levels
    /// 4/3/2 all share `defcon_escalation_secs`; 5 and 1 have their own.
    pub fn defcon_duration_secs(&self, level: u8) -> u64 {
        match level {
            5 => self.defcon5_secs,
            4 | 3 | 2 => self.defcon_escalation_secs,
            1 => self.defcon1_secs,
            _ => 0,
        }
    }
}
