//! Game rules: phase durations and scoring constants.

use std::time::Duration;

use super::phase::Phase;

/// Timing and scoring configuration shared by every room of a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Lobby countdown armed when the first player arrives
    pub time_to_start: Duration,
    /// Time the drawer has to pick one of the candidate words
    pub choose_word: Duration,
    /// Length of the drawing phase
    pub drawing: Duration,
    /// How long the revealed word stays on screen after a round
    pub results: Duration,
    /// Interval of the "time remaining" notifications
    pub tick_interval: Duration,
    /// Deducted from the drawer when nobody guessed the word
    pub penalty_nobody_guessed: i64,
    /// Points every correct guess earns
    pub guess_score_base: i64,
    /// Extra points scaled by the fraction of drawing time left
    pub guess_score_time_bonus: i64,
    /// Drawer bonus per correct guess, split across the guessing players
    pub guess_score_drawer: i64,
}

impl GameRules {
    /// Duration of the timer armed when `phase` is entered.
    pub fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::WaitingForPlayers | Phase::WaitingForStart => self.time_to_start,
            Phase::NewRound => self.choose_word,
            Phase::GameRunning => self.drawing,
            Phase::AfterGame => self.results,
        }
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            time_to_start: Duration::from_secs(10),
            choose_word: Duration::from_secs(20),
            drawing: Duration::from_secs(60),
            results: Duration::from_secs(10),
            tick_interval: Duration::from_secs(1),
            penalty_nobody_guessed: 50,
            guess_score_base: 50,
            guess_score_time_bonus: 50,
            guess_score_drawer: 50,
        }
    }
}
