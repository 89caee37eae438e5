//! UseCase: ルーム参加処理
//!
//! ## 処理の流れ
//!
//! 1. 参加先のルームを解決する（存在しなければ `game_error(room_not_found)`）
//! 2. 別のルームに参加中であれば先にそのルームから退出する
//! 3. ルームアクターに参加コマンドを送り、拒否された場合は `game_error` で通知する
//! 4. 成功したらレジストリにセッションを記録する

use std::sync::Arc;

use crate::{
    domain::{
        ClientId, ConnectionId, GameErrorKind, MessagePusher, RoomError, RoomName, UserName,
    },
    infrastructure::{
        registry::{ConnectionRegistry, PlayerSession},
        room_actor::{RoomCommandError, RoomHandle},
    },
};

use super::{error::JoinRoomError, notify::push_game_error};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    /// MessagePusher（エラー通知用）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// WebSocket のハンドシェイクでルームに参加する
    pub async fn execute(
        &self,
        client_id: &ClientId,
        connection_id: ConnectionId,
        user_name: String,
        room_name: String,
    ) -> Result<RoomName, JoinRoomError> {
        let user_name = UserName::new(user_name)?;
        let Some(handle) = self.resolve_room(room_name).await else {
            push_game_error(
                self.message_pusher.as_ref(),
                client_id,
                GameErrorKind::RoomNotFound,
            )
            .await;
            return Err(JoinRoomError::RoomNotFound);
        };

        // クライアントは同時に1つのルームにしか所属できない
        if let Some(previous) = self.registry.session(client_id).await
            && &previous.room_name != handle.name()
        {
            tracing::info!(
                "Client '{}' moves from room '{}' to '{}'",
                client_id,
                previous.room_name,
                handle.name()
            );
            self.registry.remove_player(client_id).await;
            if let Some(old_room) = self.registry.room(&previous.room_name).await {
                let _ = old_room.leave(client_id.clone());
            }
        }

        match handle.join(client_id.clone(), user_name.clone()).await {
            Ok(()) => {}
            Err(RoomCommandError::Rejected(e)) => {
                push_game_error(self.message_pusher.as_ref(), client_id, (&e).into()).await;
                return Err(JoinRoomError::Rejected(e));
            }
            Err(RoomCommandError::Closed) => return Err(JoinRoomError::RoomUnavailable),
        }

        self.registry
            .player_joined(PlayerSession {
                client_id: client_id.clone(),
                user_name,
                room_name: handle.name().clone(),
                connection_id,
                is_online: true,
            })
            .await;
        tracing::info!("Client '{}' joined room '{}'", client_id, handle.name());
        Ok(handle.name().clone())
    }

    /// HTTP の事前チェック: ルームが存在し、名前が空いていて、満員でないこと
    pub async fn check(&self, user_name: String, room_name: String) -> Result<(), JoinRoomError> {
        let user_name = UserName::new(user_name)?;
        let handle = self
            .resolve_room(room_name)
            .await
            .ok_or(JoinRoomError::RoomNotFound)?;

        let snapshot = handle.snapshot();
        if snapshot.contains_user_name(&user_name) {
            return Err(RoomError::UserNameTaken(user_name.into_string()).into());
        }
        if snapshot.player_count() >= handle.max_players() {
            return Err(RoomError::RoomFull {
                capacity: handle.max_players(),
            }
            .into());
        }
        Ok(())
    }

    async fn resolve_room(&self, room_name: String) -> Option<RoomHandle> {
        let room_name = RoomName::new(room_name).ok()?;
        self.registry.room(&room_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{GameRules, MockMessagePusher, Phase, WordProvider},
        infrastructure::message_pusher::WebSocketMessagePusher,
        usecase::CreateRoomUseCase,
    };
    use sketchroom_shared::time::FixedClock;

    fn cid(s: &str) -> ClientId {
        ClientId::new(s.to_string()).unwrap()
    }

    /// ルームを作成したレジストリ（ルームアクターは実際の WebSocketMessagePusher で配送する）
    async fn registry_with_room(name: &str, max_players: usize) -> Arc<ConnectionRegistry> {
        let registry = Arc::new(ConnectionRegistry::new());
        CreateRoomUseCase::new(
            registry.clone(),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(WordProvider::new(["apple", "banana", "cherry"]).unwrap()),
            GameRules::default(),
            Arc::new(FixedClock::new(0)),
            8,
        )
        .execute(name.to_string(), max_players)
        .await
        .unwrap();
        registry
    }

    fn expect_game_error(pusher: &mut MockMessagePusher, client: &'static str, error: &'static str) {
        pusher
            .expect_push_to()
            .withf(move |client_id, content| {
                client_id.as_str() == client
                    && content.contains("game_error")
                    && content.contains(error)
            })
            .times(1)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn test_join_room_success() {
        // テスト項目: 参加に成功するとセッションが記録される
        // given (前提条件):
        let registry = registry_with_room("lobby", 4).await;
        let usecase = JoinRoomUseCase::new(registry.clone(), Arc::new(MockMessagePusher::new()));
        let connection = ConnectionId::generate();

        // when (操作):
        let joined = usecase
            .execute(&cid("alice"), connection, "alice".to_string(), "lobby".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(joined.unwrap().as_str(), "lobby");
        let session = registry.session(&cid("alice")).await.unwrap();
        assert_eq!(session.connection_id, connection);
        assert!(session.is_online);
        let room = registry.room_of(&cid("alice")).await.unwrap();
        let handle = registry.room(&room).await.unwrap();
        assert_eq!(handle.snapshot().player_count(), 1);
        assert_eq!(handle.snapshot().phase, Phase::WaitingForPlayers);
    }

    #[tokio::test]
    async fn test_join_unknown_room_notifies_sender() {
        // テスト項目: 存在しないルームへの参加は送信者に room_not_found が通知される
        // given (前提条件):
        let registry = registry_with_room("lobby", 4).await;
        let mut pusher = MockMessagePusher::new();
        expect_game_error(&mut pusher, "alice", "room_not_found");
        let usecase = JoinRoomUseCase::new(registry.clone(), Arc::new(pusher));

        // when (操作):
        let result = usecase
            .execute(
                &cid("alice"),
                ConnectionId::generate(),
                "alice".to_string(),
                "nowhere".to_string(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinRoomError::RoomNotFound));
        assert!(registry.session(&cid("alice")).await.is_none());
    }

    #[tokio::test]
    async fn test_join_full_room_notifies_sender() {
        // テスト項目: 満員のルームへの参加は room_full が通知され、セッションは作られない
        // given (前提条件):
        let registry = registry_with_room("duel", 2).await;
        let mut pusher = MockMessagePusher::new();
        expect_game_error(&mut pusher, "charlie", "room_full");
        let usecase = JoinRoomUseCase::new(registry.clone(), Arc::new(pusher));
        for name in ["alice", "bob"] {
            usecase
                .execute(&cid(name), ConnectionId::generate(), name.to_string(), "duel".to_string())
                .await
                .unwrap();
        }

        // when (操作):
        let result = usecase
            .execute(
                &cid("charlie"),
                ConnectionId::generate(),
                "charlie".to_string(),
                "duel".to_string(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinRoomError::Rejected(RoomError::RoomFull { capacity: 2 }))
        );
        assert!(registry.session(&cid("charlie")).await.is_none());
    }

    #[tokio::test]
    async fn test_join_other_room_leaves_previous_one() {
        // テスト項目: 別のルームに参加すると前のルームから退出する
        // given (前提条件):
        let registry = registry_with_room("first", 4).await;
        CreateRoomUseCase::new(
            registry.clone(),
            Arc::new(WebSocketMessagePusher::new()),
            Arc::new(WordProvider::new(["apple", "banana", "cherry"]).unwrap()),
            GameRules::default(),
            Arc::new(FixedClock::new(0)),
            8,
        )
        .execute("second".to_string(), 4)
        .await
        .unwrap();
        let usecase = JoinRoomUseCase::new(registry.clone(), Arc::new(MockMessagePusher::new()));
        usecase
            .execute(&cid("alice"), ConnectionId::generate(), "alice".to_string(), "first".to_string())
            .await
            .unwrap();

        // when (操作):
        usecase
            .execute(&cid("alice"), ConnectionId::generate(), "alice".to_string(), "second".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let first = registry
            .room(&RoomName::new("first".to_string()).unwrap())
            .await
            .unwrap();
        let second = registry
            .room(&RoomName::new("second".to_string()).unwrap())
            .await
            .unwrap();
        // 退出コマンドの処理完了を待つため、後続のコマンドを同期的に処理させる
        first
            .join(cid("probe"), UserName::new("probe".to_string()).unwrap())
            .await
            .unwrap();
        assert!(!first.snapshot().contains_user_name(&UserName::new("alice".to_string()).unwrap()));
        assert_eq!(second.snapshot().player_count(), 1);
        assert_eq!(registry.room_of(&cid("alice")).await.unwrap().as_str(), "second");
    }

    #[tokio::test]
    async fn test_check_reports_taken_name() {
        // テスト項目: 事前チェックでユーザー名の重複が検出される
        // given (前提条件):
        let registry = registry_with_room("lobby", 4).await;
        let usecase = JoinRoomUseCase::new(registry.clone(), Arc::new(MockMessagePusher::new()));
        usecase
            .execute(&cid("alice"), ConnectionId::generate(), "alice".to_string(), "lobby".to_string())
            .await
            .unwrap();

        // when (操作):
        let taken = usecase.check("alice".to_string(), "lobby".to_string()).await;
        let free = usecase.check("bob".to_string(), "lobby".to_string()).await;
        let missing = usecase.check("bob".to_string(), "nowhere".to_string()).await;

        // then (期待する結果):
        assert_eq!(
            taken,
            Err(JoinRoomError::Rejected(RoomError::UserNameTaken(
                "alice".to_string()
            )))
        );
        assert_eq!(free, Ok(()));
        assert_eq!(missing, Err(JoinRoomError::RoomNotFound));
    }
}
