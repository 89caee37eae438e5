//! Outbound game events and the effects the room state machine emits.
//!
//! The room never performs I/O itself: every operation returns a list of
//! [`Effect`]s that the room actor executes in order.

use std::time::Duration;

use super::{
    error::RoomError,
    phase::Phase,
    value_object::{ClientId, RoomName, UserName},
};

/// One segment of a drawing, relayed verbatim between clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: i32,
    pub thickness: f32,
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    /// Touch event kind reported by the client (down / move / up)
    pub motion_event: i32,
}

/// A chat line as relayed to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub from: UserName,
    pub room_name: RoomName,
    pub message: String,
    pub timestamp: i64,
}

/// Entry of the standings list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStanding {
    pub user_name: UserName,
    pub is_drawing: bool,
    pub score: i64,
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncementKind {
    PlayerGuessedWord,
    PlayerJoined,
    PlayerLeft,
    EverybodyGuessedIt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub message: String,
    pub timestamp: i64,
    pub kind: AnnouncementKind,
}

/// Error notification sent to a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameErrorKind {
    RoomNotFound,
    RoomFull,
    UserNameTaken,
}

impl From<&RoomError> for GameErrorKind {
    fn from(error: &RoomError) -> Self {
        match error {
            RoomError::RoomFull { .. } => Self::RoomFull,
            RoomError::UserNameTaken(_) => Self::UserNameTaken,
        }
    }
}

/// Message pushed from the server to one or more players.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `phase` is only set on the first notification of a timer
    PhaseChange {
        phase: Option<Phase>,
        remaining: Duration,
        drawing_player: Option<UserName>,
    },
    NewWords(Vec<String>),
    GameState {
        drawing_player: UserName,
        word: String,
    },
    PlayerList(Vec<PlayerStanding>),
    Announcement(Announcement),
    ChosenWord {
        word: String,
        room_name: RoomName,
    },
    Chat(ChatLine),
    DrawData(Stroke),
    CurRoundDrawInfo(Vec<Stroke>),
    Error(GameErrorKind),
}

/// Side effect requested by the room state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver to one player
    Send { to: ClientId, event: ServerEvent },
    /// Deliver to every player of the room, optionally skipping one
    Broadcast {
        event: ServerEvent,
        except: Option<ClientId>,
    },
    /// Replace the room timer with a new one
    ArmTimer { duration: Duration },
    CancelTimer,
}

impl Effect {
    pub fn broadcast(event: ServerEvent) -> Self {
        Self::Broadcast {
            event,
            except: None,
        }
    }
}
