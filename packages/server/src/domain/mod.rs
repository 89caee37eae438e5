//! Domain layer: game rules and state, free of I/O.

pub mod error;
pub mod event;
pub mod message_pusher;
pub mod phase;
pub mod player;
pub mod room;
pub mod rules;
pub mod value_object;
pub mod word;

pub use error::{RoomError, ValueObjectError, WordError};
pub use event::{
    Announcement, AnnouncementKind, ChatLine, Effect, GameErrorKind, PlayerStanding, ServerEvent,
    Stroke,
};
pub use message_pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use phase::{Drawer, Phase, RoomPhase};
pub use player::Player;
pub use room::{PlayerSummary, Room, RoomSnapshot};
pub use rules::GameRules;
pub use value_object::{ClientId, ConnectionId, RoomName, UserName};
pub use word::{WORD_CHOICES, WordProvider, mask_word, matches_word};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
