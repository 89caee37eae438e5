//! Sketchroom: game server for a real-time drawing-and-guessing game.
//!
//! Players join rooms over WebSocket; each room cycles through lobby, word
//! choice, drawing and results phases while the server relays strokes and
//! chat, checks guesses and keeps the score.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
