//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{RoomError, ValueObjectError};

/// ルーム作成の拒否理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("room '{0}' already exists")]
    AlreadyExists(String),

    #[error("a room needs at least {min} players")]
    TooFewPlayers { min: usize },

    #[error("a room can hold at most {max} players")]
    TooManyPlayers { max: usize },

    #[error("invalid room name: {0}")]
    InvalidName(#[from] ValueObjectError),
}

/// ルーム参加の失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinRoomError {
    #[error("room not found")]
    RoomNotFound,

    #[error(transparent)]
    Rejected(#[from] RoomError),

    #[error("invalid user name: {0}")]
    InvalidUserName(#[from] ValueObjectError),

    #[error("room is not accepting players")]
    RoomUnavailable,
}

/// ゲーム操作（描画・チャット・単語選択）の失敗理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameActionError {
    #[error("room not found")]
    RoomNotFound,

    #[error("client is not a member of this room")]
    NotAMember,

    #[error("room is not accepting commands")]
    RoomUnavailable,
}
