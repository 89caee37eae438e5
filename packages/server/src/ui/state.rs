//! Shared application state.

use std::sync::Arc;

use sketchroom_shared::time::Clock;

use crate::{
    config::{HeartbeatConfig, ServerConfig},
    domain::{MessagePusher, WordProvider},
    infrastructure::{message_pusher::WebSocketMessagePusher, registry::ConnectionRegistry},
    usecase::{
        ConnectPlayerUseCase, CreateRoomUseCase, DisconnectPlayerUseCase, GameActionUseCase,
        GetRoomsUseCase, JoinRoomUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectPlayerUseCase（クライアント接続のユースケース）
    pub connect_player_usecase: Arc<ConnectPlayerUseCase>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// GameActionUseCase（描画・チャット・単語選択のユースケース）
    pub game_action_usecase: Arc<GameActionUseCase>,
    /// DisconnectPlayerUseCase（クライアント切断のユースケース）
    pub disconnect_player_usecase: Arc<DisconnectPlayerUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// ConnectionRegistry（シャットダウンとデバッグ用）
    pub registry: Arc<ConnectionRegistry>,
    pub heartbeat: HeartbeatConfig,
}

impl AppState {
    /// Wire every dependency of the server.
    pub fn from_config(
        config: &ServerConfig,
        words: Arc<WordProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // Initialize dependencies in order:
        // 1. ConnectionRegistry
        // 2. MessagePusher
        // 3. UseCases

        // 1. Create ConnectionRegistry (rooms and player sessions)
        let registry = Arc::new(ConnectionRegistry::new());

        // 2. Create MessagePusher (WebSocket implementation)
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 3. Create UseCases
        let connect_player_usecase = Arc::new(ConnectPlayerUseCase::new(message_pusher.clone()));
        let join_room_usecase = Arc::new(JoinRoomUseCase::new(
            registry.clone(),
            message_pusher.clone(),
        ));
        let game_action_usecase = Arc::new(GameActionUseCase::new(
            registry.clone(),
            message_pusher.clone(),
        ));
        let disconnect_player_usecase = Arc::new(DisconnectPlayerUseCase::new(
            registry.clone(),
            message_pusher.clone(),
            config.reconnect_grace,
        ));
        let create_room_usecase = Arc::new(CreateRoomUseCase::new(
            registry.clone(),
            message_pusher,
            words,
            config.rules.clone(),
            clock,
            config.max_room_size,
        ));
        let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));

        Self {
            connect_player_usecase,
            join_room_usecase,
            game_action_usecase,
            disconnect_player_usecase,
            create_room_usecase,
            get_rooms_usecase,
            registry,
            heartbeat: config.heartbeat,
        }
    }
}
