//! Request handlers.

mod heartbeat;
mod http;
mod websocket;

pub use http::{create_room, debug_room_state, get_rooms, health_check, join_room};
pub use websocket::websocket_handler;
