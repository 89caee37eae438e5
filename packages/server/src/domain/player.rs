//! Player entity.

use super::value_object::{ClientId, UserName};

/// One participant of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub client_id: ClientId,
    pub user_name: UserName,
    /// Can go negative through the no-guess penalty
    pub score: i64,
    pub is_drawing: bool,
    pub is_online: bool,
    /// 1-based, recomputed whenever standings are broadcast
    pub rank: u32,
}

impl Player {
    pub fn new(client_id: ClientId, user_name: UserName) -> Self {
        Self {
            client_id,
            user_name,
            score: 0,
            is_drawing: false,
            is_online: true,
            rank: 0,
        }
    }
}
