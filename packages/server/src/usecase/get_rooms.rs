//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::infrastructure::{registry::ConnectionRegistry, room_actor::RoomHandle};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 名前に `search_query` を含むルームを名前順で返す（大文字小文字は区別しない）
    pub async fn execute(&self, search_query: Option<&str>) -> Vec<RoomHandle> {
        let query = search_query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut rooms: Vec<RoomHandle> = self
            .registry
            .rooms()
            .await
            .into_iter()
            .filter(|room| match &query {
                Some(q) => room.name().as_str().to_lowercase().contains(q),
                None => true,
            })
            .collect();
        rooms.sort_by(|a, b| a.name().cmp(b.name()));
        rooms
    }
}
