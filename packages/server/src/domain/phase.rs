//! Room phases.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{
    event::Stroke,
    value_object::{ClientId, UserName},
};

/// Stage of the round lifecycle, as announced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    WaitingForPlayers,
    WaitingForStart,
    NewRound,
    GameRunning,
    AfterGame,
}

/// The player drawing this round.
///
/// Kept by value so a round can finish after the drawer disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawer {
    pub client_id: ClientId,
    pub user_name: UserName,
}

/// Phase together with the data that only exists in that phase.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomPhase {
    WaitingForPlayers,
    WaitingForStart,
    NewRound {
        drawer: Drawer,
        candidates: Vec<String>,
    },
    GameRunning {
        drawer: Drawer,
        word: String,
        started_at: Instant,
        /// Players that already guessed the word this round
        guessed: HashSet<ClientId>,
        /// Strokes drawn so far, replayed to late joiners
        strokes: Vec<Stroke>,
    },
    AfterGame {
        drawer: Drawer,
        word: String,
    },
}

impl RoomPhase {
    pub fn kind(&self) -> Phase {
        match self {
            Self::WaitingForPlayers => Phase::WaitingForPlayers,
            Self::WaitingForStart => Phase::WaitingForStart,
            Self::NewRound { .. } => Phase::NewRound,
            Self::GameRunning { .. } => Phase::GameRunning,
            Self::AfterGame { .. } => Phase::AfterGame,
        }
    }

    pub fn drawer(&self) -> Option<&Drawer> {
        match self {
            Self::NewRound { drawer, .. }
            | Self::GameRunning { drawer, .. }
            | Self::AfterGame { drawer, .. } => Some(drawer),
            Self::WaitingForPlayers | Self::WaitingForStart => None,
        }
    }

    /// The secret word, once chosen.
    pub fn word(&self) -> Option<&str> {
        match self {
            Self::GameRunning { word, .. } | Self::AfterGame { word, .. } => Some(word),
            _ => None,
        }
    }
}
