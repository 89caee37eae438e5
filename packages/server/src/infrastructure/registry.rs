//! Connection registry: which client plays in which room.
//!
//! ## 責務
//!
//! - `ClientId → PlayerSession` と `RoomName → RoomHandle` の2つの対応表を管理
//! - クライアントが所属するルームの解決
//! - オフライン化と猶予期間後の削除の判定
//!
//! ロックはマップの読み書きの間だけ保持し、ルームへのコマンド送信中は保持しない。

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    domain::{ClientId, ConnectionId, RoomName, UserName},
    infrastructure::room_actor::RoomHandle,
};

/// A client that completed the join handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSession {
    pub client_id: ClientId,
    pub user_name: UserName,
    pub room_name: RoomName,
    /// Connection the handshake arrived on
    pub connection_id: ConnectionId,
    pub is_online: bool,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    players: Mutex<HashMap<ClientId, PlayerSession>>,
    rooms: Mutex<HashMap<RoomName, RoomHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ----------------------------------------
    // Rooms
    // ----------------------------------------

    /// Register a room unless the name is already taken.
    ///
    /// The rejected handle is given back to the caller.
    pub async fn insert_room(&self, handle: RoomHandle) -> Result<(), RoomHandle> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(handle.name()) {
            return Err(handle);
        }
        rooms.insert(handle.name().clone(), handle);
        Ok(())
    }

    pub async fn room(&self, name: &RoomName) -> Option<RoomHandle> {
        self.rooms.lock().await.get(name).cloned()
    }

    pub async fn contains_room(&self, name: &RoomName) -> bool {
        self.rooms.lock().await.contains_key(name)
    }

    pub async fn rooms(&self) -> Vec<RoomHandle> {
        self.rooms.lock().await.values().cloned().collect()
    }

    // ----------------------------------------
    // Players
    // ----------------------------------------

    /// Record a successful join, replacing any previous session of the client.
    pub async fn player_joined(&self, session: PlayerSession) -> Option<PlayerSession> {
        tracing::debug!(
            "Client '{}' is now '{}' in room '{}'",
            session.client_id,
            session.user_name,
            session.room_name
        );
        self.players
            .lock()
            .await
            .insert(session.client_id.clone(), session)
    }

    pub async fn session(&self, client_id: &ClientId) -> Option<PlayerSession> {
        self.players.lock().await.get(client_id).cloned()
    }

    pub async fn room_of(&self, client_id: &ClientId) -> Option<RoomName> {
        self.players
            .lock()
            .await
            .get(client_id)
            .map(|s| s.room_name.clone())
    }

    /// Flag the session offline if it still belongs to `connection_id`.
    pub async fn mark_offline(
        &self,
        client_id: &ClientId,
        connection_id: ConnectionId,
    ) -> Option<PlayerSession> {
        let mut players = self.players.lock().await;
        let session = players
            .get_mut(client_id)
            .filter(|s| s.connection_id == connection_id)?;
        session.is_online = false;
        Some(session.clone())
    }

    /// Remove the session if it is still offline on `connection_id`.
    ///
    /// Returns `None` when the client reconnected in the meantime.
    pub async fn remove_if_offline(
        &self,
        client_id: &ClientId,
        connection_id: ConnectionId,
    ) -> Option<PlayerSession> {
        let mut players = self.players.lock().await;
        match players.get(client_id) {
            Some(s) if !s.is_online && s.connection_id == connection_id => {
                players.remove(client_id)
            }
            _ => None,
        }
    }

    pub async fn remove_player(&self, client_id: &ClientId) -> Option<PlayerSession> {
        self.players.lock().await.remove(client_id)
    }

    pub async fn player_count(&self) -> usize {
        self.players.lock().await.len()
    }

    /// Stop every room actor.
    pub async fn shutdown(&self) {
        let rooms = self.rooms.lock().await;
        tracing::info!("Stopping {} room(s)", rooms.len());
        for handle in rooms.values() {
            handle.shutdown();
        }
    }
}
