//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - クライアントごとに現在の接続の送信チャネルを管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! 同じクライアントが再接続すると新しいチャネルで上書きされます。古い接続の
//! 切断処理が新しい接続を消さないよう、登録解除は `ConnectionId` が一致した
//! 場合のみ行います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: client_id
    /// Value: 現在の接続 ID とその送信チャネル
    clients: Mutex<HashMap<ClientId, (ConnectionId, PusherChannel)>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みクライアント数
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        client_id: ClientId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) {
        let mut clients = self.clients.lock().await;
        if clients
            .insert(client_id.clone(), (connection_id, sender))
            .is_some()
        {
            tracing::debug!("Client '{}' replaced its previous connection", client_id);
        } else {
            tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        }
    }

    async fn unregister_client(&self, client_id: &ClientId, connection_id: ConnectionId) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(client_id) {
            Some((current, _)) if *current == connection_id => {
                clients.remove(client_id);
                tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
                true
            }
            Some(_) => {
                tracing::debug!(
                    "Connection '{}' of client '{}' is stale, keeping the newer one",
                    connection_id,
                    client_id
                );
                false
            }
            None => false,
        }
    }

    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        if let Some((_, sender)) = clients.get(client_id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::trace!("Pushed message to client '{}'", client_id);
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(
                client_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(&self, targets: &[ClientId], content: &str) -> Vec<ClientId> {
        let clients = self.clients.lock().await;
        let mut unreachable = Vec::new();

        for target in targets {
            match clients.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some((_, sender)) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to client '{}': {}", target, e);
                        unreachable.push(target.clone());
                    }
                }
                None => {
                    tracing::debug!("Client '{}' not connected during broadcast, skipping", target);
                    unreachable.push(target.clone());
                }
            }
        }

        unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn cid(s: &str) -> ClientId {
        ClientId::new(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_push_to_success() {
        // テスト項目: 特定のクライアントにメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher
            .register_client(cid("alice"), ConnectionId::generate(), tx)
            .await;

        // when (操作):
        let result = pusher.push_to(&cid("alice"), "Hello").await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_push_to_client_not_found() {
        // テスト項目: 存在しないクライアントへの送信はエラーを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher.push_to(&cid("nonexistent"), "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
    }

    #[tokio::test]
    async fn test_push_to_closed_channel_fails() {
        // テスト項目: 受信側が閉じたチャネルへの送信は PushFailed になる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher
            .register_client(cid("alice"), ConnectionId::generate(), tx)
            .await;
        drop(rx);

        // when (操作):
        let result = pusher.push_to(&cid("alice"), "Hello").await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::PushFailed(_))));
    }

    #[tokio::test]
    async fn test_broadcast_reports_unreachable_clients() {
        // テスト項目: ブロードキャストは届いたクライアントに送信し、届かなかったクライアントを返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher
            .register_client(cid("alice"), ConnectionId::generate(), tx1)
            .await;
        pusher
            .register_client(cid("bob"), ConnectionId::generate(), tx2)
            .await;

        // when (操作):
        let targets = vec![cid("alice"), cid("bob"), cid("nonexistent")];
        let unreachable = pusher.broadcast(&targets, "Broadcast message").await;

        // then (期待する結果):
        assert_eq!(unreachable, vec![cid("nonexistent")]);
        assert_eq!(rx1.recv().await, Some("Broadcast message".to_string()));
        assert_eq!(rx2.recv().await, Some("Broadcast message".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_empty_targets() {
        // テスト項目: 空のターゲットリストでもエラーにならない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let unreachable = pusher.broadcast(&[], "Message").await;

        // then (期待する結果):
        assert!(unreachable.is_empty());
    }

    #[tokio::test]
    async fn test_stale_connection_cannot_unregister_newer_one() {
        // テスト項目: 再接続後、古い接続の登録解除は新しい接続に影響しない
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let old_connection = ConnectionId::generate();
        let new_connection = ConnectionId::generate();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        pusher
            .register_client(cid("alice"), old_connection, old_tx)
            .await;
        pusher
            .register_client(cid("alice"), new_connection, new_tx)
            .await;

        // when (操作):
        let removed = pusher.unregister_client(&cid("alice"), old_connection).await;

        // then (期待する結果):
        assert!(!removed);
        assert_eq!(pusher.client_count().await, 1);
        pusher.push_to(&cid("alice"), "still here").await.unwrap();
        assert_eq!(new_rx.recv().await, Some("still here".to_string()));

        // 現在の接続 ID なら解除できる
        assert!(pusher.unregister_client(&cid("alice"), new_connection).await);
        assert_eq!(pusher.client_count().await, 0);
    }
}
