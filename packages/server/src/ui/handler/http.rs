//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use sketchroom_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    domain::{RoomError, RoomName, RoomSnapshot},
    infrastructure::dto::http::{
        BasicApiResponse, CreateRoomRequest, GetRoomsQuery, JoinRoomQuery, RoomResponse,
    },
    ui::state::AppState,
    usecase::{CreateRoomError, JoinRoomError},
};

/// Debug endpoint to get the current state of a room (for testing purposes)
pub async fn debug_room_state(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<RoomSnapshot>, StatusCode> {
    let room_name = RoomName::new(room_name).map_err(|_| StatusCode::NOT_FOUND)?;
    let room = state
        .registry
        .room(&room_name)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(room.snapshot()))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create a room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> (StatusCode, Json<BasicApiResponse>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Malformed create room request: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(BasicApiResponse::rejected(rejection.body_text())),
            );
        }
    };

    match state
        .create_room_usecase
        .execute(request.name, request.max_players)
        .await
    {
        Ok(_) => (StatusCode::OK, Json(BasicApiResponse::ok())),
        Err(e) => {
            tracing::info!("Room creation rejected: {}", e);
            let message = match e {
                CreateRoomError::AlreadyExists(_) => "Room already exists.".to_string(),
                CreateRoomError::TooFewPlayers { min } => {
                    format!("The minimum room size is {min}.")
                }
                CreateRoomError::TooManyPlayers { max } => {
                    format!("The maximum room size is {max}.")
                }
                CreateRoomError::InvalidName(e) => format!("Invalid room name: {e}."),
            };
            (StatusCode::OK, Json(BasicApiResponse::rejected(message)))
        }
    }
}

/// Get list of rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GetRoomsQuery>,
) -> Json<Vec<RoomResponse>> {
    let rooms = state
        .get_rooms_usecase
        .execute(query.search_query.as_deref())
        .await;

    // Domain Model から DTO への変換
    let rooms = rooms
        .into_iter()
        .map(|room| RoomResponse {
            name: room.name().as_str().to_string(),
            max_players: room.max_players(),
            player_count: room.snapshot().player_count(),
            created_at: timestamp_to_jst_rfc3339(room.created_at()),
        })
        .collect();
    Json(rooms)
}

/// Check whether a user can join a room
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JoinRoomQuery>,
) -> Json<BasicApiResponse> {
    let response = match state
        .join_room_usecase
        .check(query.user_name, query.room_name)
        .await
    {
        Ok(()) => BasicApiResponse::ok(),
        Err(JoinRoomError::RoomNotFound) => BasicApiResponse::rejected("Room not found."),
        Err(JoinRoomError::Rejected(RoomError::UserNameTaken(_))) => {
            BasicApiResponse::rejected("A player with this username already joined.")
        }
        Err(JoinRoomError::Rejected(RoomError::RoomFull { .. })) => {
            BasicApiResponse::rejected("This room is already full.")
        }
        Err(e @ JoinRoomError::InvalidUserName(_)) => BasicApiResponse::rejected(e.to_string()),
        Err(JoinRoomError::RoomUnavailable) => {
            BasicApiResponse::rejected("This room is not accepting players.")
        }
    };
    Json(response)
}
