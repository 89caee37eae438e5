//! Domain error types.

use thiserror::Error;

/// Errors raised while constructing value objects from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// The value is empty (or whitespace only)
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the rejected field
        field: &'static str,
    },

    /// The value exceeds the maximum length
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        /// Name of the rejected field
        field: &'static str,
        /// Maximum number of characters
        max: usize,
        /// Actual number of characters
        actual: usize,
    },
}

/// Errors raised by the word provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    /// The vocabulary cannot satisfy the requested number of words
    #[error("vocabulary has {available} words but {requested} were requested")]
    EmptyVocabulary {
        /// Number of distinct words requested
        requested: usize,
        /// Number of words in the vocabulary
        available: usize,
    },
}

/// Errors raised when a player cannot be added to a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// The room already holds its maximum number of players
    #[error("room is full ({capacity} players)")]
    RoomFull {
        /// Capacity of the room
        capacity: usize,
    },

    /// Another client in the room already uses this display name
    #[error("user name '{0}' is already taken in this room")]
    UserNameTaken(String),
}
