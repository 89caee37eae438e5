//! UseCase: クライアント切断処理
//!
//! ## 切断の種類
//!
//! - 明示的な切断要求（`disconnect_request`）: 即座にルームから削除する
//! - 通信断・ハートビート失敗: オフラインにし、再接続の猶予期間が過ぎても
//!   オフラインのままなら削除する
//!
//! どちらの場合も、既に新しい接続に置き換えられた古い接続の切断は何もしない。

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{ClientId, ConnectionId, MessagePusher},
    infrastructure::registry::ConnectionRegistry,
};

/// 切断処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// ルームから削除した
    Removed,
    /// オフラインにし、猶予期間後の削除を予約した
    Deferred,
    /// ハンドシェイク前の接続だった
    NotJoined,
    /// 既に新しい接続に置き換えられていた
    Stale,
}

/// クライアント切断のユースケース
pub struct DisconnectPlayerUseCase {
    registry: Arc<ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    /// 再接続を待つ時間
    reconnect_grace: Duration,
}

impl DisconnectPlayerUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        reconnect_grace: Duration,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            reconnect_grace,
        }
    }

    /// 切断処理を実行
    ///
    /// `requested` は クライアントが明示的に切断を要求したかどうか
    pub async fn execute(
        &self,
        client_id: &ClientId,
        connection_id: ConnectionId,
        requested: bool,
    ) -> DisconnectOutcome {
        // 送信チャネルを外すと writer が終了し、ソケットが閉じる
        if !self
            .message_pusher
            .unregister_client(client_id, connection_id)
            .await
        {
            return DisconnectOutcome::Stale;
        }

        let Some(session) = self
            .registry
            .session(client_id)
            .await
            .filter(|s| s.connection_id == connection_id)
        else {
            return DisconnectOutcome::NotJoined;
        };
        let room = self.registry.room(&session.room_name).await;

        if requested || self.reconnect_grace.is_zero() {
            self.registry.remove_player(client_id).await;
            if let Some(room) = room {
                let _ = room.leave(client_id.clone());
            }
            tracing::info!(
                "Client '{}' left room '{}'",
                client_id,
                session.room_name
            );
            return DisconnectOutcome::Removed;
        }

        self.registry.mark_offline(client_id, connection_id).await;
        if let Some(room) = &room {
            let _ = room.set_online(client_id.clone(), false);
        }
        tracing::info!(
            "Client '{}' went offline, removing it in {}s unless it reconnects",
            client_id,
            self.reconnect_grace.as_secs()
        );

        let registry = self.registry.clone();
        let client_id = client_id.clone();
        let grace = self.reconnect_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if registry
                .remove_if_offline(&client_id, connection_id)
                .await
                .is_some()
            {
                tracing::info!("Client '{}' did not reconnect, removing it", client_id);
                if let Some(room) = room {
                    let _ = room.leave(client_id);
                }
            }
        });
        DisconnectOutcome::Deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{GameRules, MockMessagePusher, UserName, WordProvider},
        infrastructure::{message_pusher::WebSocketMessagePusher, room_actor::RoomHandle},
        usecase::{CreateRoomUseCase, JoinRoomUseCase},
    };
    use sketchroom_shared::time::FixedClock;

    const GRACE: Duration = Duration::from_secs(30);

    fn cid(s: &str) -> ClientId {
        ClientId::new(s.to_string()).unwrap()
    }

    fn uname(s: &str) -> UserName {
        UserName::new(s.to_string()).unwrap()
    }

    async fn joined_room(
        registry: &Arc<ConnectionRegistry>,
        players: &[(&str, ConnectionId)],
    ) -> RoomHandle {
        let room_pusher = Arc::new(WebSocketMessagePusher::new());
        let room = CreateRoomUseCase::new(
            registry.clone(),
            room_pusher.clone(),
            Arc::new(WordProvider::new(["apple", "banana", "cherry"]).unwrap()),
            GameRules::default(),
            Arc::new(FixedClock::new(0)),
            8,
        )
        .execute("lobby".to_string(), 4)
        .await
        .unwrap();
        let join = JoinRoomUseCase::new(registry.clone(), room_pusher);
        for (name, connection) in players {
            join.execute(&cid(name), *connection, name.to_string(), "lobby".to_string())
                .await
                .unwrap();
        }
        room
    }

    fn pusher_unregistering(current: bool) -> Arc<MockMessagePusher> {
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_unregister_client()
            .returning(move |_, _| current);
        Arc::new(pusher)
    }

    /// 先行するコマンドが処理されるまで待つ
    async fn sync(room: &RoomHandle) {
        let _ = room.join(cid("probe"), uname("probe")).await;
    }

    #[tokio::test]
    async fn test_requested_disconnect_removes_immediately() {
        // テスト項目: 明示的な切断要求ではすぐにルームから削除される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ConnectionId::generate();
        let room = joined_room(&registry, &[("alice", connection)]).await;
        let usecase = DisconnectPlayerUseCase::new(registry.clone(), pusher_unregistering(true), GRACE);

        // when (操作):
        let outcome = usecase.execute(&cid("alice"), connection, true).await;

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::Removed);
        assert!(registry.session(&cid("alice")).await.is_none());
        sync(&room).await;
        assert!(!room.snapshot().contains_user_name(&uname("alice")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_loss_removes_after_grace() {
        // テスト項目: 通信断では猶予期間の後にルームから削除される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ConnectionId::generate();
        let room = joined_room(&registry, &[("alice", connection)]).await;
        let usecase = DisconnectPlayerUseCase::new(registry.clone(), pusher_unregistering(true), GRACE);

        // when (操作):
        let outcome = usecase.execute(&cid("alice"), connection, false).await;

        // then (期待する結果): 猶予期間中はオフラインのまま残る
        assert_eq!(outcome, DisconnectOutcome::Deferred);
        assert!(!registry.session(&cid("alice")).await.unwrap().is_online);

        tokio::time::sleep(GRACE + Duration::from_secs(1)).await;
        assert!(registry.session(&cid("alice")).await.is_none());
        sync(&room).await;
        assert!(!room.snapshot().contains_user_name(&uname("alice")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_within_grace_keeps_player() {
        // テスト項目: 猶予期間中に再接続したプレイヤーは削除されない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let old_connection = ConnectionId::generate();
        let room = joined_room(&registry, &[("alice", old_connection)]).await;
        let usecase = DisconnectPlayerUseCase::new(registry.clone(), pusher_unregistering(true), GRACE);
        usecase.execute(&cid("alice"), old_connection, false).await;

        // when (操作): 新しい接続で再びハンドシェイクする
        let new_connection = ConnectionId::generate();
        JoinRoomUseCase::new(registry.clone(), Arc::new(MockMessagePusher::new()))
            .execute(&cid("alice"), new_connection, "alice".to_string(), "lobby".to_string())
            .await
            .unwrap();
        tokio::time::sleep(GRACE + Duration::from_secs(1)).await;

        // then (期待する結果):
        let session = registry.session(&cid("alice")).await.unwrap();
        assert_eq!(session.connection_id, new_connection);
        sync(&room).await;
        assert!(room.snapshot().contains_user_name(&uname("alice")));
    }

    #[tokio::test]
    async fn test_stale_connection_is_ignored() {
        // テスト項目: 置き換え済みの古い接続の切断は何もしない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let connection = ConnectionId::generate();
        joined_room(&registry, &[("alice", connection)]).await;
        let usecase = DisconnectPlayerUseCase::new(registry.clone(), pusher_unregistering(false), GRACE);

        // when (操作):
        let outcome = usecase.execute(&cid("alice"), connection, true).await;

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::Stale);
        assert!(registry.session(&cid("alice")).await.is_some());
    }
}
