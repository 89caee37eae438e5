//! UseCase: ゲーム中の操作（描画・チャット・単語選択）
//!
//! 送信者が所属しているルームへの操作だけをルームアクターに転送する。

use std::sync::Arc;

use crate::{
    domain::{ClientId, GameErrorKind, MessagePusher, RoomName, Stroke},
    infrastructure::registry::ConnectionRegistry,
};

use super::{error::GameActionError, notify::push_game_error};

/// ルームに転送する操作
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Draw(Stroke),
    Chat(String),
    ChooseWord(String),
}

/// ゲーム操作のユースケース
pub struct GameActionUseCase {
    registry: Arc<ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GameActionUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        client_id: &ClientId,
        room_name: String,
        action: GameAction,
    ) -> Result<(), GameActionError> {
        let room = match RoomName::new(room_name) {
            Ok(name) => self.registry.room(&name).await,
            Err(_) => None,
        };
        let Some(room) = room else {
            push_game_error(
                self.message_pusher.as_ref(),
                client_id,
                GameErrorKind::RoomNotFound,
            )
            .await;
            return Err(GameActionError::RoomNotFound);
        };

        if self.registry.room_of(client_id).await.as_ref() != Some(room.name()) {
            tracing::debug!(
                "Client '{}' is not in room '{}', ignoring {:?}",
                client_id,
                room.name(),
                action
            );
            return Err(GameActionError::NotAMember);
        }

        let client_id = client_id.clone();
        let sent = match action {
            GameAction::Draw(stroke) => room.draw(client_id, stroke),
            GameAction::Chat(message) => room.chat(client_id, message),
            GameAction::ChooseWord(word) => room.choose_word(client_id, word),
        };
        sent.map_err(|_| GameActionError::RoomUnavailable)
    }
}
