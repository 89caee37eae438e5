//! Conversion logic between DTOs and domain types.

use crate::domain::{
    AnnouncementKind, GameErrorKind, PlayerStanding, RoomName, ServerEvent, Stroke,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl From<dto::DrawDataDto> for Stroke {
    fn from(dto: dto::DrawDataDto) -> Self {
        Self {
            color: dto.color,
            thickness: dto.thickness,
            from_x: dto.from_x,
            from_y: dto.from_y,
            to_x: dto.to_x,
            to_y: dto.to_y,
            motion_event: dto.motion_event,
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

fn draw_data(stroke: Stroke, room_name: &RoomName) -> dto::DrawDataDto {
    dto::DrawDataDto {
        room_name: room_name.as_str().to_string(),
        color: stroke.color,
        thickness: stroke.thickness,
        from_x: stroke.from_x,
        from_y: stroke.from_y,
        to_x: stroke.to_x,
        to_y: stroke.to_y,
        motion_event: stroke.motion_event,
    }
}

impl From<PlayerStanding> for dto::PlayerDataDto {
    fn from(standing: PlayerStanding) -> Self {
        Self {
            user_name: standing.user_name.into_string(),
            is_drawing: standing.is_drawing,
            score: standing.score,
            rank: standing.rank,
        }
    }
}

impl From<AnnouncementKind> for dto::AnnouncementType {
    fn from(kind: AnnouncementKind) -> Self {
        match kind {
            AnnouncementKind::PlayerGuessedWord => Self::PlayerGuessedWord,
            AnnouncementKind::PlayerJoined => Self::PlayerJoined,
            AnnouncementKind::PlayerLeft => Self::PlayerLeft,
            AnnouncementKind::EverybodyGuessedIt => Self::EverybodyGuessedIt,
        }
    }
}

impl From<GameErrorKind> for dto::GameErrorType {
    fn from(kind: GameErrorKind) -> Self {
        match kind {
            GameErrorKind::RoomNotFound => Self::RoomNotFound,
            GameErrorKind::RoomFull => Self::RoomFull,
            GameErrorKind::UserNameTaken => Self::UserNameTaken,
        }
    }
}

/// Build the wire message for an event emitted by `room_name`.
pub fn to_server_message(event: ServerEvent, room_name: &RoomName) -> dto::ServerMessage {
    match event {
        ServerEvent::PhaseChange {
            phase,
            remaining,
            drawing_player,
        } => dto::ServerMessage::PhaseChange(dto::PhaseChangeDto {
            phase,
            time: remaining.as_millis() as u64,
            drawing_player: drawing_player.map(|name| name.into_string()),
        }),
        ServerEvent::NewWords(words) => dto::ServerMessage::NewWords { new_words: words },
        ServerEvent::GameState {
            drawing_player,
            word,
        } => dto::ServerMessage::GameState(dto::GameStateDto {
            drawing_player: drawing_player.into_string(),
            word,
        }),
        ServerEvent::PlayerList(standings) => dto::ServerMessage::PlayerDataList {
            players: standings.into_iter().map(Into::into).collect(),
        },
        ServerEvent::Announcement(announcement) => {
            dto::ServerMessage::Announcement(dto::AnnouncementDto {
                message: announcement.message,
                timestamp: announcement.timestamp,
                announcement_type: announcement.kind.into(),
            })
        }
        ServerEvent::ChosenWord { word, room_name } => {
            dto::ServerMessage::ChosenWord(dto::ChosenWordDto {
                chosen_word: word,
                room_name: room_name.into_string(),
            })
        }
        ServerEvent::Chat(line) => dto::ServerMessage::ChatMessage(dto::ChatMessageDto {
            from: line.from.into_string(),
            room_name: line.room_name.into_string(),
            message: line.message,
            timestamp: line.timestamp,
        }),
        ServerEvent::DrawData(stroke) => dto::ServerMessage::DrawData(draw_data(stroke, room_name)),
        ServerEvent::CurRoundDrawInfo(strokes) => dto::ServerMessage::CurRoundDrawInfo {
            data: strokes
                .into_iter()
                .map(|stroke| draw_data(stroke, room_name))
                .collect(),
        },
        ServerEvent::Error(kind) => dto::ServerMessage::GameError(dto::GameErrorDto {
            error_type: kind.into(),
        }),
    }
}
