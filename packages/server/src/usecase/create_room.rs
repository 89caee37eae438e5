//! UseCase: ルーム作成処理

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use sketchroom_shared::time::Clock;

use crate::{
    domain::{GameRules, MessagePusher, Room, RoomName, WordProvider},
    infrastructure::{registry::ConnectionRegistry, room_actor::RoomHandle},
};

use super::error::CreateRoomError;

/// 1ルームに必要な最小人数
pub const MIN_PLAYERS: usize = 2;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    registry: Arc<ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    words: Arc<WordProvider>,
    rules: GameRules,
    clock: Arc<dyn Clock>,
    /// 作成できるルームの最大定員
    max_room_size: usize,
}

impl CreateRoomUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        words: Arc<WordProvider>,
        rules: GameRules,
        clock: Arc<dyn Clock>,
        max_room_size: usize,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            words,
            rules,
            clock,
            max_room_size,
        }
    }

    /// ルームを作成し、そのアクターを起動する
    pub async fn execute(
        &self,
        name: String,
        max_players: usize,
    ) -> Result<RoomHandle, CreateRoomError> {
        let name = RoomName::new(name)?;
        if max_players < MIN_PLAYERS {
            return Err(CreateRoomError::TooFewPlayers { min: MIN_PLAYERS });
        }
        if max_players > self.max_room_size {
            return Err(CreateRoomError::TooManyPlayers {
                max: self.max_room_size,
            });
        }
        if self.registry.contains_room(&name).await {
            return Err(CreateRoomError::AlreadyExists(name.into_string()));
        }

        let room = Room::new(
            name.clone(),
            max_players,
            self.rules.clone(),
            self.words.clone(),
            self.clock.clone(),
            StdRng::from_entropy(),
        );
        let handle = RoomHandle::spawn(room, self.message_pusher.clone(), self.clock.now_millis());

        // 同名のルームが同時に作成された場合は後から来た方を止める
        if let Err(rejected) = self.registry.insert_room(handle.clone()).await {
            rejected.shutdown();
            return Err(CreateRoomError::AlreadyExists(name.into_string()));
        }

        tracing::info!("Room '{}' created for up to {} players", name, max_players);
        Ok(handle)
    }
}
