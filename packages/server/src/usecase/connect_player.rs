//! UseCase: クライアント接続処理
//!
//! WebSocket 接続ごとに `ConnectionId` を発行し、送信チャネルを
//! `MessagePusher` に登録する。同じ client_id の再接続は既存の接続を置き換える。

use std::sync::Arc;

use crate::domain::{ClientId, ConnectionId, MessagePusher, PusherChannel};

/// クライアント接続のユースケース
pub struct ConnectPlayerUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectPlayerUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 接続を登録し、この接続の ID を返す
    pub async fn execute(&self, client_id: ClientId, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_client(client_id.clone(), connection_id, sender)
            .await;
        tracing::info!(
            "Client '{}' connected (connection '{}')",
            client_id,
            connection_id
        );
        connection_id
    }
}
