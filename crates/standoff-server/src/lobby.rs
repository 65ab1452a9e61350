//! Lobby creation, joining, readiness, and territory selection, up to the
//! `start_game` transition that hands a finalized member list off to a new
//! session (§4.2).
//!
//! Grounded on `relay-server::hand_shake`'s validate → allocate → register
//! shape (`process_handshake_server`/`process_handshake_client`), generalized
//! from an anonymous two-sided room to a named lobby with per-member
//! readiness and territory claims, and on
//! `relay-server::lobby::reload_config`'s swap-a-map-under-a-lock pattern.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use standoff_core::config::PartialSessionConfig;
use standoff_core::error::LobbyError;
use standoff_core::state::{LobbyMemberSummary, LobbySummary};

/// One player's standing inside a not-yet-started lobby.
pub struct LobbyMember {
    pub player_id: String,
    pub name: String,
    pub ready: bool,
    pub territory_id: Option<String>,
}

/// A pending lobby. Removed from the manager the instant `start_game`
/// succeeds — from then on the match lives in a `SessionActor` instead.
pub struct Lobby {
    pub id: String,
    pub name: String,
    pub host_id: String,
    pub config: PartialSessionConfig,
    pub members: Vec<LobbyMember>,
    touched_at: Instant,
}

impl Lobby {
    fn summary(&self, territory_ids: &[String]) -> LobbySummary {
        let taken: Vec<&str> = self.members.iter().filter_map(|m| m.territory_id.as_deref()).collect();
        LobbySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            host_id: self.host_id.clone(),
            members: self
                .members
                .iter()
                .map(|m| LobbyMemberSummary {
                    player_id: m.player_id.clone(),
                    name: m.name.clone(),
                    ready: m.ready,
                    territory_id: m.territory_id.clone(),
                })
                .collect(),
            available_territories: territory_ids.iter().filter(|t| !taken.contains(&t.as_str())).cloned().collect(),
        }
    }

    fn member_mut(&mut self, player_id: &str) -> Result<&mut LobbyMember, LobbyError> {
        self.members.iter_mut().find(|m| m.player_id == player_id).ok_or(LobbyError::NotAMember)
    }
}

/// All pending lobbies, keyed by id.
pub struct LobbyManager {
    territory_ids: Vec<String>,
    lobbies: Mutex<HashMap<String, Lobby>>,
}

impl LobbyManager {
    pub fn new(territory_ids: Vec<String>) -> Self {
        Self { territory_ids, lobbies: Mutex::new(HashMap::new()) }
    }

    pub async fn list(&self) -> Vec<LobbySummary> {
        self.lobbies.lock().await.values().map(|l| l.summary(&self.territory_ids)).collect()
    }

    pub async fn create(
        &self,
        host_id: String,
        host_name: String,
        lobby_name: String,
        config: Option<PartialSessionConfig>,
    ) -> LobbySummary {
        let id = uuid::Uuid::new_v4().to_string();
        let lobby = Lobby {
            id: id.clone(),
            name: lobby_name,
            host_id: host_id.clone(),
            config: config.unwrap_or_default(),
            members: vec![LobbyMember { player_id: host_id, name: host_name, ready: false, territory_id: None }],
            touched_at: Instant::now(),
        };
        let summary = lobby.summary(&self.territory_ids);
        self.lobbies.lock().await.insert(id, lobby);
        summary
    }

    pub async fn join(&self, lobby_id: &str, player_id: String, name: String) -> Result<LobbySummary, LobbyError> {
        let mut lobbies = self.lobbies.lock().await;
        let lobby = lobbies.get_mut(lobby_id).ok_or_else(|| LobbyError::NotFound(lobby_id.to_string()))?;
        if lobby.config.max_players.is_some_and(|max| lobby.members.len() as u32 >= max) {
            return Err(LobbyError::Full);
        }
        lobby.members.push(LobbyMember { player_id, name, ready: false, territory_id: None });
        lobby.touched_at = Instant::now();
        Ok(lobby.summary(&self.territory_ids))
    }

    /// Remove a player from whichever lobby holds them. Returns the lobby's
    /// new summary so the caller can re-broadcast it, or `None` if the lobby
    /// is now empty (in which case it's dropped) or the player wasn't in one.
    pub async fn leave(&self, player_id: &str) -> Option<LobbySummary> {
        let mut lobbies = self.lobbies.lock().await;
        let lobby_id = lobbies.iter().find(|(_, l)| l.members.iter().any(|m| m.player_id == player_id))?.0.clone();
        let lobby = lobbies.get_mut(&lobby_id)?;
        lobby.members.retain(|m| m.player_id != player_id);
        if lobby.members.is_empty() {
            lobbies.remove(&lobby_id);
            return None;
        }
        // The host leaving hands off to the next remaining member.
        if lobby.host_id == player_id {
            lobby.host_id = lobby.members[0].player_id.clone();
        }
        lobby.touched_at = Instant::now();
        Some(lobby.summary(&self.territory_ids))
    }

    pub async fn set_ready(&self, player_id: &str, ready: bool) -> Result<LobbySummary, LobbyError> {
        self.mutate_member_lobby(player_id, |member| {
            member.ready = ready;
            Ok(())
        })
        .await
    }

    pub async fn select_territory(&self, player_id: &str, territory_id: &str) -> Result<LobbySummary, LobbyError> {
        if !self.territory_ids.iter().any(|t| t == territory_id)  {
            return Err(LobbyError::UnknownTerritory(territory_id.to_string()));
        }
        let territory_id = territory_id.to_string();
        let territory_ids = &self.territory_ids;
        let mut lobbies = self.lobbies.lock().await;
        let lobby_id =
            lobbies.iter().find(|(_, l)| l.members.iter().any(|m| m.player_id == player_id)).map(|(id, _)| id.clone())
                .ok_or(LobbyError::NotAMember)?;
        let lobby = lobbies.get_mut(&lobby_id).expect("looked up by id above");
        if lobby.members.iter().any(|m| m.player_id != player_id && m.territory_id.as_deref() == Some(territory_id.as_str())) {
            return Err(LobbyError::TerritoryTaken(territory_id));
        }
        lobby.member_mut(player_id)?.territory_id = Some(territory_id);
        lobby.touched_at = Instant::now();
        Ok(lobby.summary(territory_ids))
    }

    async fn mutate_member_lobby(
        &self,
        player_id: &str,
        f: impl FnOnce(&mut LobbyMember) -> Result<(), LobbyError>,
    ) -> Result<LobbySummary, LobbyError> {
        let mut lobbies = self.lobbies.lock().await;
        let lobby_id =
            lobbies.iter().find(|(_, l)| l.members.iter().any(|m| m.player_id == player_id)).map(|(id, _)| id.clone())
                .ok_or(LobbyError::NotAMember)?;
        let lobby = lobbies.get_mut(&lobby_id).expect("looked up by id above");
        f(lobby.member_mut(player_id)?)?;
        lobby.touched_at = Instant::now();
        Ok(lobby.summary(&self.territory_ids))
    }

    /// Drop lobbies that have seen no join/ready/territory activity for
    /// `max_idle` (§5 "reaped" after an idle period). Returns the ids removed
    /// so the caller can log or notify.
    pub async fn reap_idle(&self, max_idle: Duration) -> Vec<String> {
        let mut lobbies = self.lobbies.lock().await;
        let stale: Vec<String> =
            lobbies.iter().filter(|(_, l)| l.touched_at.elapsed() >= max_idle).map(|(id, _)| id.clone()).collect();
        for id in &stale {
            lobbies.remove(id);
        }
        stale
    }

    /// Validate and remove a lobby for `start_game` (§4.2's "start" effect):
    /// the caller must be host, at least two members, and every member ready
    /// with a territory chosen. Returns the finalized lobby for the caller to
    /// build a session from.
    pub async fn try_start(&self, player_id: &str) -> Result<Lobby, LobbyError> {
        let mut lobbies = self.lobbies.lock().await;
        let lobby_id =
            lobbies.iter().find(|(_, l)| l.members.iter().any(|m| m.player_id == player_id)).map(|(id, _)| id.clone())
                .ok_or(LobbyError::NotAMember)?;
        {
            let lobby = lobbies.get(&lobby_id).expect("looked up by id above");
            if lobby.host_id != player_id {
                return Err(LobbyError::NotHost);
            }
            if lobby.members.len() < 2 {
                return Err(LobbyError::NotEnoughPlayers);
            }
            if lobby.members.iter().any(|m| !m.ready || m.territory_id.is_none()) {
                return Err(LobbyError::NotAllReady);
            }
        }
        Ok(lobbies.remove(&lobby_id).expect("looked up by id above"))
    }
}
