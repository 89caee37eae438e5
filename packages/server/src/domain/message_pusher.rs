//! メッセージ送信（通知）の抽象化
//!
//! ## 概要
//!
//! UseCase やルームアクターはこの trait を通してクライアントにメッセージを届けます。
//! 具体的な送信手段（WebSocket など）は Infrastructure 層が実装します。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::value_object::{ClientId, ConnectionId};

/// 1接続分の送信チャネル（シリアライズ済みの JSON を流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' is not connected")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// クライアントへのメッセージ送信
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャネルを登録する（既存の接続は置き換えられる）
    async fn register_client(
        &self,
        client_id: ClientId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    );

    /// 指定した接続が現在の接続である場合のみ登録を解除する
    ///
    /// 解除した場合は `true` を返す
    async fn unregister_client(&self, client_id: &ClientId, connection_id: ConnectionId) -> bool;

    /// 特定のクライアントに送信する
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信する
    ///
    /// 一部の送信失敗は許容し、届かなかったクライアントを返す
    async fn broadcast(&self, targets: &[ClientId], content: &str) -> Vec<ClientId>;
}
