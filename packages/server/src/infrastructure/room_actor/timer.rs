//! Phase timer schedule driven by the room actor.
//!
//! A schedule is plain data: the actor sleeps until [`TickSchedule::next_deadline`]
//! and then calls [`TickSchedule::advance`]. Replacing the schedule is the only
//! way to cancel a timer, so a replaced timer can never fire.

use std::time::Duration;

use tokio::time::Instant;

/// Lower bound for the tick interval, so a zero interval cannot spin.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStep {
    /// Time is left; announce it
    Remaining(Duration),
    /// The deadline passed
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    deadline: Instant,
    next_tick: Instant,
    tick_interval: Duration,
}

impl TickSchedule {
    pub fn new(now: Instant, duration: Duration, tick_interval: Duration) -> Self {
        let tick_interval = tick_interval.max(MIN_TICK_INTERVAL);
        let deadline = now + duration;
        Self {
            deadline,
            next_tick: (now + tick_interval).min(deadline),
            tick_interval,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Instant the actor has to wake up at.
    pub fn next_deadline(&self) -> Instant {
        self.next_tick
    }

    /// Move to the next tick.
    pub fn advance(&mut self, now: Instant) -> TimerStep {
        if now >= self.deadline {
            return TimerStep::Expired;
        }
        while self.next_tick <= now {
            self.next_tick = (self.next_tick + self.tick_interval).min(self.deadline);
        }
        TimerStep::Remaining(self.deadline - now)
    }
}
