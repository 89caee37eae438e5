//! Data Transfer Objects (DTOs) for the game server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API request/response DTOs
//! - `conversion`: mapping between domain events and DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
