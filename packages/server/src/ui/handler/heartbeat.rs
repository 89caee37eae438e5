//! Missed-probe counter of one WebSocket connection.

use std::sync::atomic::{AtomicU32, Ordering};

/// Shared between the reader (pongs) and the writer (pings).
#[derive(Debug)]
pub struct Heartbeat {
    missed: AtomicU32,
    max_missed: u32,
}

impl Heartbeat {
    pub fn new(max_missed: u32) -> Self {
        Self {
            missed: AtomicU32::new(0),
            max_missed,
        }
    }

    /// Account for a ping about to be sent.
    ///
    /// Returns `false` once `max_missed` earlier pings went unanswered.
    pub fn probe(&self) -> bool {
        self.missed.fetch_add(1, Ordering::AcqRel) < self.max_missed
    }

    /// A pong arrived.
    pub fn pong(&self) {
        self.missed.store(0, Ordering::Release);
    }

    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::Acquire)
    }
}
