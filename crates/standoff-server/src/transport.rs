//! Per-connection WebSocket framing and message routing (§4.1, §6).
//!
//! Grounded on `relay-server::message_relay`'s paired send/receive task
//! shape: split the socket, spawn one task per direction, and tear down
//! whichever is still running the instant the other exits via
//! `tokio::select!`. The wire format here is `serde_json`-tagged
//! `ClientMessage`/`ServerMessage` text frames rather than the relay's
//! length-prefixed binary protocol, since there's no WASM client on the
//! other end to share a `postcard` schema with.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use standoff_core::commands::ClientMessage;
use standoff_core::error::LobbyError;
use standoff_core::events::ServerMessage;

use crate::session_actor::SessionInput;
use crate::AppState;

/// Take ownership of an upgraded socket for the lifetime of one connection.
pub async fn handle_socket(socket: WebSocket, player_id: String, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let mut outbound_rx = state.connections.register(player_id.clone()).await;
    state.connections.send(&player_id, ServerMessage::LobbyList { lobbies: state.lobbies.list().await }).await;

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let Ok(text) = serde_json::to_string(&message) else { continue };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_player_id = player_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let Ok(Message::Text(text)) = frame else { continue };
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => route_message(&recv_state, &recv_player_id, message).await,
                Err(err) => {
                    tracing::warn!(player_id = %recv_player_id, %err, "malformed client message");
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    on_disconnect(&state, &player_id).await;
}

/// Dispatch one decoded message to the lobby manager or the player's running
/// session, whichever currently owns them.
async fn route_message(state: &Arc<AppState>, player_id: &str, message: ClientMessage) {
    match message {
        ClientMessage::CreateLobby { player_name, lobby_name, config } => {
            let summary = state.lobbies.create(player_id.to_string(), player_name, lobby_name, config).await;
            state.connections.send(player_id, ServerMessage::LobbyUpdate { lobby: summary }).await;
        }
        ClientMessage::JoinLobby { lobby_id, player_name } => {
            match state.lobbies.join(&lobby_id, player_id.to_string(), player_name).await {
                Ok(summary) => broadcast_lobby(state, &summary).await,
                Err(e) => lobby_error(state, player_id, e).await,
            }
        }
        ClientMessage::LeaveLobby => {
            if let Some(summary) = state.lobbies.leave(player_id).await {
                broadcast_lobby(state, &summary).await;
            }
        }
        ClientMessage::SetReady { ready } => match state.lobbies.set_ready(player_id, ready).await {
            Ok(summary) => broadcast_lobby(state, &summary).await,
            Err(e) => lobby_error(state, player_id, e).await,
        },
        ClientMessage::SelectTerritory { territory_id } => {
            match state.lobbies.select_territory(player_id, &territory_id).await {
                Ok(summary) => broadcast_lobby(state, &summary).await,
                Err(e) => lobby_error(state, player_id, e).await,
            }
        }
        ClientMessage::StartGame => crate::start_game(state, player_id).await,
        other => forward_to_session(state, player_id, other).await,
    }
}

async fn broadcast_lobby(state: &Arc<AppState>, summary: &standoff_core::state::LobbySummary) {
    let member_ids: Vec<String> = summary.members.iter().map(|m| m.player_id.clone()).collect();
    state.connections.broadcast(&member_ids, ServerMessage::LobbyUpdate { lobby: summary.clone() }).await;
}

async fn lobby_error(state: &Arc<AppState>, player_id: &str, err: LobbyError) {
    state.connections.send(player_id, ServerMessage::LobbyError { message: err.to_string() }).await;
}

/// Forward an in-game command to the session this player is currently
/// seated in, or reply with an error if they aren't in one.
async fn forward_to_session(state: &Arc<AppState>, player_id: &str, message: ClientMessage) {
    let Some(sender) = session_sender_for(state, player_id).await else {
        state
            .connections
            .send(player_id, ServerMessage::Error { code: "no_session".into(), message: "not in a running game".into() })
            .await;
        return;
    };
    let _ = sender.send(SessionInput::Command(player_id.to_string(), message)).await;
}

async fn session_sender_for(state: &Arc<AppState>, player_id: &str) -> Option<mpsc::Sender<SessionInput>> {
    let session_id = state.player_session.lock().await.get(player_id).cloned()?;
    state.sessions.lock().await.get(&session_id).cloned()
}

pub(crate) async fn on_disconnect(state: &Arc<AppState>, player_id: &str) {
    state.connections.remove(player_id).await;
    if let Some(summary) = state.lobbies.leave(player_id).await {
        broadcast_lobby(state, &summary).await;
    }
    // Entities stay in the session (§3); only the per-player delta cache and
    // AI bookkeeping the engine holds need forgetting.
    if let Some(sender) = session_sender_for(state, player_id).await {
        let _ = sender.send(SessionInput::Disconnected(player_id.to_string())).await;
    }
}
