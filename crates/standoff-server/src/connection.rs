//! The connection registry (§4.1): every live WebSocket maps to one player
//! id and an outbound channel the rest of the server pushes `ServerMessage`s
//! through, without needing to know whether that player is in a lobby or a
//! running session.
//!
//! Grounded on `relay-server::lobby::AppState`'s `Mutex<HashMap<...>>`
//! registry shape, generalized from a host/client room pairing to a flat
//! player-id-keyed map, since every connection here talks to the same
//! authoritative server rather than to a peer.

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};

use standoff_core::constants::CONNECTION_CHANNEL_CAPACITY;
use standoff_core::events::ServerMessage;

/// All live connections, keyed by player id.
pub struct ConnectionRegistry {
    senders: Mutex<HashMap<String, mpsc::Sender<ServerMessage>>>,
    dropped_tx: mpsc::Sender<String>,
}

impl ConnectionRegistry {
    /// `dropped_tx` receives a player id every time `send` finds their
    /// channel full or closed and reaps them, so the caller can drive the
    /// same disconnect path a closed socket would (§4.1).
    pub fn new(dropped_tx: mpsc::Sender<String>) -> Self {
        Self { senders: Mutex::new(HashMap::new()), dropped_tx }
    }

    /// Register a new connection, replacing any stale sender a prior
    /// connection for this player left behind (its forwarding task simply
    /// finds its channel closed and exits).
    pub async fn register(&self, player_id: String) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(CONNECTION_CHANNEL_CAPACITY);
        self.senders.lock().await.insert(player_id, tx);
        rx
    }

    pub async fn remove(&self, player_id: &str) {
        self.senders.lock().await.remove(player_id);
    }

    /// Best-effort delivery. A full channel means the connection is already
    /// behind the high-water mark (§4.1); a missing one means the player has
    /// already disconnected. A full/closed channel gets reaped immediately
    /// rather than left to silently swallow every future message: the
    /// player is removed and reported on `dropped_tx` so the rest of the
    /// server tears them out of their lobby/session just as it would on a
    /// socket close.
    pub async fn send(&self, player_id: &str, message: ServerMessage) {
        let sender = self.senders.lock().await.get(player_id).cloned();
        if let Some(sender) = sender {
            if sender.try_send(message).is_err() {
                tracing::warn!(player_id, "dropping backpressured connection");
                self.remove(player_id).await;
                let _ = self.dropped_tx.try_send(player_id.to_string());
            }
        }
    }

    pub async fn broadcast(&self, player_ids: &[String], message: ServerMessage) {
        for player_id in player_ids {
            self.send(player_id, message.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> (ConnectionRegistry, mpsc::Receiver<String>) {
        let (dropped_tx, dropped_rx) = mpsc::channel(16);
        (ConnectionRegistry::new(dropped_tx), dropped_rx)
    }

    #[tokio::test]
    async fn send_delivers_to_a_registered_connection() {
        let (registry, _dropped_rx) = test_registry();
        let mut rx = registry.register("alice".into()).await;

        registry.send("alice", ServerMessage::Error { code: "x".into(), message: "y".into() }).await;

        assert!(matches!(rx.recv().await, Some(ServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn send_to_an_unregistered_player_is_a_silent_no_op() {
        let (registry, _dropped_rx) = test_registry();
        registry.send("nobody", ServerMessage::Error { code: "x".into(), message: "y".into() }).await;
    }

    #[tokio::test]
    async fn remove_stops_further_delivery() {
        let (registry, _dropped_rx) = test_registry();
        let mut rx = registry.register("alice".into()).await;
        registry.remove("alice").await;

        registry.send("alice", ServerMessage::Error { code: "x".into(), message: "y".into() }).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_listed_player() {
        let (registry, _dropped_rx) = test_registry();
        let mut alice_rx = registry.register("alice".into()).await;
        let mut bob_rx = registry.register("bob".into()).await;

        registry
            .broadcast(&["alice".to_string(), "bob".to_string()], ServerMessage::Error { code: "x".into(), message: "y".into() })
            .await;

        assert!(matches!(alice_rx.recv().await, Some(ServerMessage::Error { .. })));
        assert!(matches!(bob_rx.recv().await, Some(ServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn a_full_channel_is_reaped_and_reported_on_dropped_tx() {
        let (dropped_tx, mut dropped_rx) = mpsc::channel(16);
        let registry = ConnectionRegistry::new(dropped_tx);
        let _rx = registry.register("alice".into()).await;

        for _ in 0..CONNECTION_CHANNEL_CAPACITY + 1 {
            registry.send("alice", ServerMessage::Error { code: "x".into(), message: "y".into() }).await;
        }

        assert_eq!(dropped_rx.recv().await.as_deref(), Some("alice"));
        assert!(registry.senders.lock().await.get("alice").is_none());
    }
}
