//! The per-match actor: owns one `SimulationEngine` and drives its `tick()`
//! on a fixed-rate timer, fanning the tick's output out to each player's
//! connection (§4.3, §4.12).
//!
//! Grounded on `deterrence-app::game_loop`'s shape (drain commands → advance
//! one tick → publish the result each iteration), with
//! `tokio::time::interval` in place of `std::thread::sleep`-based pacing
//! since the rest of this server is already async, and command delivery by
//! `tokio::select!` against an mpsc channel instead of `try_recv` draining,
//! since an async task can simply wait on both at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;

use standoff_core::commands::ClientMessage;
use standoff_core::constants::{CONNECTION_CHANNEL_CAPACITY, TICK_MS};
use standoff_core::enums::SessionPhase;
use standoff_core::events::{ServerMessage, SimEvent};
use standoff_sim::SimulationEngine;

use crate::connection::ConnectionRegistry;

/// Registry type a session removes its own entry from once its actor stops.
pub type SessionRegistry = Arc<Mutex<HashMap<String, mpsc::Sender<SessionInput>>>>;

/// One thing that can happen to a running session between ticks: a queued
/// player command, or a connection dropping (so the actor can forget that
/// player's delta cache and AI bookkeeping — their entities stay put, §3).
pub enum SessionInput {
    Command(String, ClientMessage),
    Disconnected(String),
}

/// Spawn a session actor for `engine`, returning the sender its connections
/// should forward decoded `ClientMessage`s and disconnect notices through.
/// The actor removes its own entry from `sessions` the moment it stops.
pub fn spawn(
    engine: SimulationEngine,
    connections: Arc<ConnectionRegistry>,
    sessions: SessionRegistry,
) -> mpsc::Sender<SessionInput> {
    let (command_tx, command_rx) = mpsc::channel(CONNECTION_CHANNEL_CAPACITY);
    let actor = SessionActor { engine, command_rx, connections, sessions };
    tokio::spawn(actor.run());
    command_tx
}

struct SessionActor {
    engine: SimulationEngine,
    command_rx: mpsc::Receiver<SessionInput>,
    connections: Arc<ConnectionRegistry>,
    sessions: SessionRegistry,
}

impl SessionActor {
    async fn run(mut self) {
        let session_id = self.engine.session().id.clone();
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.step().await {
                        break;
                    }
                }
                incoming = self.command_rx.recv() => {
                    match incoming {
                        Some(SessionInput::Command(player_id, message)) => self.engine.enqueue(player_id, message),
                        Some(SessionInput::Disconnected(player_id)) => self.engine.forget_player(&player_id),
                        // Every connection for this session has dropped its sender; with
                        // nothing left to ever queue a command, there's no point ticking on.
                        None => break,
                    }
                }
            }
        }

        self.sessions.lock().await.remove(&session_id);
        tracing::info!(session_id, "session ended, actor shutting down");
    }

    /// Advance one tick and publish its output. Returns `true` once the game
    /// has ended and the actor should stop.
    async fn step(&mut self) -> bool {
        let output = self.engine.tick();

        for (player_id, delta) in &output.deltas {
            if !delta.is_empty() {
                self.connections.send(player_id, ServerMessage::GameDelta { delta: delta.clone() }).await;
            }
        }
        for (player_id, reply) in output.replies {
            self.connections.send(&player_id, reply).await;
        }

        if self.engine.session().phase != SessionPhase::Ended {
            return false;
        }

        let winner = output
            .deltas
            .iter()
            .flat_map(|(_, delta)| &delta.events)
            .find_map(|event| match event {
                SimEvent::GameEnd { winner_id } => Some(winner_id.clone()),
                _ => None,
            })
            .flatten();
        let scores = self.engine.final_scores();
        let player_ids = self.engine.session().player_ids();
        self.connections.broadcast(&player_ids, ServerMessage::GameEnd { winner, scores }).await;
        true
    }
}
