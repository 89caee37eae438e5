//! Utilities shared by the Sketchroom server binaries and tests.

pub mod logger;
pub mod time;
