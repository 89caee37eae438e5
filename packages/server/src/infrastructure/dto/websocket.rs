//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged with a snake_case `"type"`; payload
//! fields are camelCase.

use serde::{Deserialize, Serialize};

use crate::domain::Phase;

/// Messages received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoomHandshake(JoinRoomHandshakeDto),
    DrawData(DrawDataDto),
    ChatMessage(ChatMessageDto),
    ChosenWord(ChosenWordDto),
    DisconnectRequest,
}

/// Messages pushed to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    DrawData(DrawDataDto),
    CurRoundDrawInfo {
        data: Vec<DrawDataDto>,
    },
    ChatMessage(ChatMessageDto),
    ChosenWord(ChosenWordDto),
    PhaseChange(PhaseChangeDto),
    NewWords {
        #[serde(rename = "newWords")]
        new_words: Vec<String>,
    },
    GameState(GameStateDto),
    PlayerDataList {
        players: Vec<PlayerDataDto>,
    },
    Announcement(AnnouncementDto),
    GameError(GameErrorDto),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomHandshakeDto {
    pub user_name: String,
    pub room_name: String,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawDataDto {
    pub room_name: String,
    pub color: i32,
    pub thickness: f32,
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub motion_event: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub from: String,
    pub room_name: String,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChosenWordDto {
    pub chosen_word: String,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChangeDto {
    /// Absent on the periodic "time remaining" notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    /// Remaining time in milliseconds
    pub time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing_player: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    pub drawing_player: String,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDataDto {
    pub user_name: String,
    pub is_drawing: bool,
    pub score: i64,
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementType {
    PlayerGuessedWord,
    PlayerJoined,
    PlayerLeft,
    EverybodyGuessedIt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementDto {
    pub message: String,
    pub timestamp: i64,
    pub announcement_type: AnnouncementType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameErrorType {
    RoomNotFound,
    RoomFull,
    UserNameTaken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameErrorDto {
    pub error_type: GameErrorType,
}

impl ServerMessage {
    /// Serialize to a JSON frame.
    ///
    /// Serialization of these DTOs cannot fail in practice; a failure is
    /// logged and yields `None`.
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!("Failed to serialize server message: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_join_room_handshake() {
        // テスト項目: join_room_handshake を camelCase のフィールドでデコードできる
        // given (前提条件):
        let json = r#"{"type":"join_room_handshake","userName":"alice","roomName":"lobby","clientId":"c-1"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            message,
            ClientMessage::JoinRoomHandshake(JoinRoomHandshakeDto {
                user_name: "alice".to_string(),
                room_name: "lobby".to_string(),
                client_id: "c-1".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_disconnect_request_without_payload() {
        // テスト項目: ペイロードのない disconnect_request をデコードできる
        // given (前提条件):
        let json = r#"{"type":"disconnect_request"}"#;

        // when (操作):
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(message, ClientMessage::DisconnectRequest);
    }

    #[test]
    fn test_decode_unknown_type_fails() {
        // テスト項目: 未知の type はデコードエラーになる
        // given (前提条件):
        let json = r#"{"type":"launch_rockets","count":3}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientMessage>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_tick_phase_change_omits_phase() {
        // テスト項目: フェーズなしの phase_change は phase フィールドを含まない
        // given (前提条件):
        let message = ServerMessage::PhaseChange(PhaseChangeDto {
            phase: None,
            time: 9000,
            drawing_player: Some("alice".to_string()),
        });

        // when (操作):
        let json = message.to_json().unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "phase_change", "time": 9000, "drawingPlayer": "alice"})
        );
    }

    #[test]
    fn test_encode_new_words_and_error() {
        // テスト項目: new_words と game_error が期待する形式でエンコードされる
        // given (前提条件):
        let words = ServerMessage::NewWords {
            new_words: vec!["apple".to_string()],
        };
        let error = ServerMessage::GameError(GameErrorDto {
            error_type: GameErrorType::RoomNotFound,
        });

        // when (操作):
        let words: serde_json::Value = serde_json::from_str(&words.to_json().unwrap()).unwrap();
        let error: serde_json::Value = serde_json::from_str(&error.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            words,
            serde_json::json!({"type": "new_words", "newWords": ["apple"]})
        );
        assert_eq!(
            error,
            serde_json::json!({"type": "game_error", "errorType": "room_not_found"})
        );
    }
}
