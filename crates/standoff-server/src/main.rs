//! Entry point: the HTTP/WebSocket listener, shared application state, and
//! the idle-lobby watchdog (§4.1, §4.2, §5).
//!
//! Grounded on `relay-server/src/main.rs`'s router/watchdog shape
//! (`tracing_subscriber::registry()` setup, a single axum `Router` serving
//! `/ws`, a periodic reaper task), with a `clap` CLI added for the bind
//! address and catalog path — the teacher has neither, since
//! `deterrence-app` is a Tauri desktop entry point with no listening socket
//! at all.

mod connection;
mod lobby;
mod session_actor;
mod transport;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use rand::Rng;
use tokio::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use standoff_catalog::Catalog;
use standoff_core::config::SessionConfig;
use standoff_core::constants::LOBBY_IDLE_REAP_SECS;
use standoff_core::events::ServerMessage;
use standoff_core::state::{GameSession, GameStateSnapshot};
use standoff_sim::session_setup::{build_session, SessionMember};
use standoff_sim::SimulationEngine;

use crate::connection::ConnectionRegistry;
use crate::lobby::LobbyManager;
use crate::session_actor::SessionRegistry;

#[derive(Parser, Debug)]
#[command(name = "standoff-server", about = "Authoritative server for standoff matches")]
struct Cli {
    /// Address to bind the WebSocket listener to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Path to a catalog JSON document. Falls back to the embedded default
    /// when omitted (§4.2).
    #[arg(long)]
    catalog: Option<PathBuf>,
}

/// Shared server state: one catalog, one connection registry, one set of
/// pending lobbies, and a map of running sessions each player is seated in.
pub struct AppState {
    catalog: Arc<Catalog>,
    connections: Arc<ConnectionRegistry>,
    lobbies: LobbyManager,
    sessions: SessionRegistry,
    player_session: Mutex<HashMap<String, String>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "standoff_server=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::load_from_path(path).unwrap_or_else(|err| {
            panic!("failed to load catalog from {}: {err}", path.display());
        }),
        None => Catalog::embedded(),
    };
    let territory_ids: Vec<String> = catalog.territory_ids().into_iter().map(str::to_string).collect();

    let (dropped_tx, mut dropped_rx) = tokio::sync::mpsc::channel::<String>(256);

    let state = Arc::new(AppState {
        catalog: Arc::new(catalog),
        connections: Arc::new(ConnectionRegistry::new(dropped_tx)),
        lobbies: LobbyManager::new(territory_ids),
        sessions: Arc::new(Mutex::new(HashMap::new())),
        player_session: Mutex::new(HashMap::new()),
    });

    let watchdog_state = state.clone();
    tokio::spawn(async move {
        let reap_period = tokio::time::Duration::from_secs(LOBBY_IDLE_REAP_SECS);
        let mut interval = tokio::time::interval(reap_period);
        loop {
            interval.tick().await;
            reap_idle_lobbies(&watchdog_state, reap_period).await;
            reap_dead_sessions(&watchdog_state).await;
        }
    });

    let dropped_state = state.clone();
    tokio::spawn(async move {
        while let Some(player_id) = dropped_rx.recv().await {
            tracing::info!(player_id, "reaping backpressured connection");
            transport::on_disconnect(&dropped_state, &player_id).await;
        }
    });

    let app = Router::new().route("/ws", get(websocket_handler)).with_state(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await.expect("failed to bind listener");
    tracing::info!(addr = %cli.bind, "standoff-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server loop exited");
}

/// Waits for Ctrl+C so `main` can stop accepting new connections while
/// sessions already running finish their current tick undisturbed (§6).
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl_c");
    tracing::info!("shutdown signal received, no longer accepting new connections");
}

/// Drop lobbies nobody has touched (joined, readied, picked a territory) for
/// a full reap period (§5).
async fn reap_idle_lobbies(state: &Arc<AppState>, max_idle: tokio::time::Duration) {
    let reaped = state.lobbies.reap_idle(max_idle).await;
    if !reaped.is_empty() {
        tracing::info!(count = reaped.len(), "reaped idle lobbies");
    }
}

/// Drop sessions whose actor task has already exited (game ended, or every
/// connection vanished); a fallback, since a session normally removes itself
/// from this map the moment its actor stops.
async fn reap_dead_sessions(state: &Arc<AppState>) {
    let mut sessions = state.sessions.lock().await;
    let before = sessions.len();
    sessions.retain(|_, sender| !sender.is_closed());
    let reaped = before - sessions.len();
    if reaped > 0 {
        tracing::info!(reaped, "removed dead sessions");
    }
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| async move {
        let player_id = uuid::Uuid::new_v4().to_string();
        transport::handle_socket(socket, player_id, state).await;
    })
}

/// Validate and execute `start_game` for the lobby `player_id` belongs to:
/// build a fresh `GameSession`, spawn its `SessionActor`, and tell every
/// member where to find it (§4.2 "start" effect).
pub(crate) async fn start_game(state: &Arc<AppState>, player_id: &str) {
    let lobby = match state.lobbies.try_start(player_id).await {
        Ok(lobby) => lobby,
        Err(e) => {
            state.connections.send(player_id, ServerMessage::LobbyError { message: e.to_string() }).await;
            return;
        }
    };

    let members: Vec<SessionMember> = lobby
        .members
        .iter()
        .map(|m| SessionMember {
            player_id: m.player_id.clone(),
            name: m.name.clone(),
            territory_id: m.territory_id.clone().expect("try_start requires every member to have chosen one"),
            is_ai: false,
        })
        .collect();

    let config = SessionConfig::resolve(Some(&lobby.config));
    let session_id = lobby.id.clone();
    let session = build_session(session_id.clone(), &state.catalog, config, &members);
    let snapshot = build_snapshot(&session);
    let seed: u64 = rand::thread_rng().gen();
    let engine = SimulationEngine::new(session, (*state.catalog).clone(), seed);

    let command_tx = session_actor::spawn(engine, state.connections.clone(), state.sessions.clone());
    state.sessions.lock().await.insert(session_id.clone(), command_tx);

    let mut player_session = state.player_session.lock().await;
    for member in &lobby.members {
        player_session.insert(member.player_id.clone(), session_id.clone());
    }
    drop(player_session);

    for member in &lobby.members {
        state
            .connections
            .send(
                &member.player_id,
                ServerMessage::GameStart { player_id: member.player_id.clone(), initial_state: snapshot.clone() },
            )
            .await;
    }
}

fn build_snapshot(session: &GameSession) -> GameStateSnapshot {
    GameStateSnapshot {
        tick: session.clock.tick,
        timestamp_ms: session.clock.timestamp_ms,
        phase: session.phase,
        defcon_level: session.defcon_level,
        defcon_ms_remaining: session.defcon_ms_remaining,
        game_speed: session.game_speed,
        players: session.players.values().cloned().collect(),
        territories: session.territories.values().cloned().collect(),
        cities: session.cities.values().cloned().collect(),
        buildings: session.buildings.values().cloned().collect(),
        missiles: session.missiles.values().cloned().collect(),
        satellites: session.satellites.values().cloned().collect(),
    }
}

/// End-to-end lobby→game transition, driven entirely through in-process
/// channels with no sockets involved — mirrors `game_loop.rs`'s
/// `test_command_channel_round_trip` shape from the teacher.
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use standoff_core::commands::{ClientMessage, PlaceableBuildingType};
    use standoff_core::types::GeoPos;

    use super::*;
    use crate::session_actor::SessionInput;

    fn new_state() -> Arc<AppState> {
        let catalog = Catalog::embedded();
        let territory_ids: Vec<String> = catalog.territory_ids().into_iter().map(str::to_string).collect();
        let (dropped_tx, _dropped_rx) = tokio::sync::mpsc::channel(16);
        Arc::new(AppState {
            catalog: Arc::new(catalog),
            connections: Arc::new(ConnectionRegistry::new(dropped_tx)),
            lobbies: LobbyManager::new(territory_ids),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            player_session: Mutex::new(HashMap::new()),
        })
    }

    #[tokio::test]
    async fn lobby_to_running_session_round_trip() {
        let state = new_state();
        let mut host_rx = state.connections.register("host".into()).await;
        let mut guest_rx = state.connections.register("guest".into()).await;

        let summary = state.lobbies.create("host".into(), "Host".into(), "Lobby".into(), None).await;
        state.lobbies.join(&summary.id, "guest".into(), "Guest".into()).await.unwrap();
        let territories = summary.available_territories.clone();
        state.lobbies.select_territory("host", &territories[0]).await.unwrap();
        state.lobbies.select_territory("guest", &territories[1]).await.unwrap();
        state.lobbies.set_ready("host", true).await.unwrap();
        state.lobbies.set_ready("guest", true).await.unwrap();

        start_game(&state, "host").await;

        let host_start = host_rx.recv().await.expect("host should receive game_start");
        assert!(matches!(host_start, ServerMessage::GameStart { .. }));
        let guest_start = guest_rx.recv().await.expect("guest should receive game_start");
        assert!(matches!(guest_start, ServerMessage::GameStart { .. }));

        assert!(state.lobbies.list().await.is_empty());
        let session_id = state.player_session.lock().await.get("host").cloned().expect("host should be seated");
        let command_tx = state.sessions.lock().await.get(&session_id).cloned().expect("session should be running");

        command_tx
            .send(SessionInput::Command(
                "host".into(),
                ClientMessage::PlaceBuilding { building_type: PlaceableBuildingType::Radar, position: GeoPos::new(10.0, 10.0) },
            ))
            .await
            .unwrap();

        let delta = tokio::time::timeout(Duration::from_secs(2), host_rx.recv())
            .await
            .expect("placing a building should produce a delta before the timeout")
            .expect("channel should stay open");
        assert!(matches!(delta, ServerMessage::GameDelta { .. }));
    }
}
