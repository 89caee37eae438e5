//! クライアントへのエラー通知

use crate::{
    domain::{ClientId, GameErrorKind, MessagePushError, MessagePusher},
    infrastructure::dto::websocket::{GameErrorDto, ServerMessage},
};

/// `game_error` を送信者だけに送る
pub(crate) async fn push_game_error(
    pusher: &dyn MessagePusher,
    client_id: &ClientId,
    kind: GameErrorKind,
) {
    let message = ServerMessage::GameError(GameErrorDto {
        error_type: kind.into(),
    });
    let Some(json) = message.to_json() else {
        return;
    };
    match pusher.push_to(client_id, &json).await {
        Ok(()) | Err(MessagePushError::ClientNotFound(_)) => {}
        Err(e) => tracing::warn!("Failed to notify '{}' of {:?}: {}", client_id, kind, e),
    }
}
