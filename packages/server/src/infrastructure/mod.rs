//! Infrastructure layer: wire DTOs, message delivery, room actors and the
//! connection registry.

pub mod dto;
pub mod message_pusher;
pub mod registry;
pub mod room_actor;
