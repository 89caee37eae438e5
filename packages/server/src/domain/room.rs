//! Room: the round lifecycle state machine.
//!
//! ## Phases
//!
//! ```text
//! WAITING_FOR_PLAYERS --2nd join--> WAITING_FOR_START --timer or full--> NEW_ROUND
//!                                                                          |
//!        NEW_ROUND <--timer-- AFTER_GAME <--timer or all guessed-- GAME_RUNNING
//! ```
//!
//! Whenever occupancy drops to one player the room falls back to
//! `WAITING_FOR_PLAYERS`; an empty room parks there without a timer.
//!
//! ## Design
//!
//! `Room` is pure: it owns the game state but performs no I/O. Every operation
//! takes the current instant and returns the [`Effect`]s to execute. The room
//! actor serializes all calls, runs the single phase timer and delivers the
//! effects.

use std::{collections::HashSet, mem, sync::Arc, time::Duration};

use rand::{rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use sketchroom_shared::time::Clock;
use tokio::time::Instant;

use super::{
    error::RoomError,
    event::{
        Announcement, AnnouncementKind, ChatLine, Effect, PlayerStanding, ServerEvent, Stroke,
    },
    phase::{Drawer, Phase, RoomPhase},
    player::Player,
    rules::GameRules,
    value_object::{ClientId, RoomName, UserName},
    word::{WORD_CHOICES, WordProvider, mask_word, matches_word},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PhaseTimer {
    armed_at: Instant,
    duration: Duration,
}

/// Read-only view of a room, replaced wholesale after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSnapshot {
    pub phase: Phase,
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    /// Never exposed: the client id is the only credential a player has
    #[serde(skip)]
    pub client_id: ClientId,
    pub user_name: UserName,
    pub score: i64,
    pub is_online: bool,
}

impl RoomSnapshot {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn contains_user_name(&self, user_name: &UserName) -> bool {
        self.players.iter().any(|p| &p.user_name == user_name)
    }
}

/// One independent game session.
pub struct Room {
    name: RoomName,
    max_players: usize,
    rules: GameRules,
    words: Arc<WordProvider>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    /// Turn order, shuffled when the lobby fills up
    players: Vec<Player>,
    phase: RoomPhase,
    next_drawer_index: usize,
    timer: Option<PhaseTimer>,
}

impl Room {
    pub fn new(
        name: RoomName,
        max_players: usize,
        rules: GameRules,
        words: Arc<WordProvider>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            name,
            max_players,
            rules,
            words,
            clock,
            rng,
            players: Vec::new(),
            phase: RoomPhase::WaitingForPlayers,
            next_drawer_index: 0,
            timer: None,
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase.kind()
    }

    pub fn phase_state(&self) -> &RoomPhase {
        &self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, client_id: &ClientId) -> Option<&Player> {
        self.players.iter().find(|p| &p.client_id == client_id)
    }

    pub fn contains_client(&self, client_id: &ClientId) -> bool {
        self.player(client_id).is_some()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.players.iter().map(|p| p.client_id.clone()).collect()
    }

    /// Time left on the running phase timer.
    pub fn timer_remaining(&self, now: Instant) -> Option<Duration> {
        self.timer.map(|t| {
            t.duration
                .saturating_sub(now.saturating_duration_since(t.armed_at))
        })
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.phase.kind(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSummary {
                    client_id: p.client_id.clone(),
                    user_name: p.user_name.clone(),
                    score: p.score,
                    is_online: p.is_online,
                })
                .collect(),
        }
    }

    /// Periodic "time remaining" notification of the running timer.
    pub fn tick_notification(&self, remaining: Duration) -> ServerEvent {
        ServerEvent::PhaseChange {
            phase: None,
            remaining,
            drawing_player: self.drawer_name(),
        }
    }

    /// Add a player, or bring a known client back online.
    ///
    /// Rejections happen before any state is touched.
    pub fn join(
        &mut self,
        client_id: ClientId,
        user_name: UserName,
        now: Instant,
    ) -> Result<Vec<Effect>, RoomError> {
        let mut effects = Vec::new();

        if let Some(player) = self.players.iter_mut().find(|p| p.client_id == client_id) {
            player.is_online = true;
            tracing::debug!("Client '{}' rejoined room '{}'", client_id, self.name);
            self.send_catch_up(&client_id, now, &mut effects);
            self.broadcast_standings(&mut effects);
            return Ok(effects);
        }
        if self.players.iter().any(|p| p.user_name == user_name) {
            return Err(RoomError::UserNameTaken(user_name.into_string()));
        }
        if self.players.len() >= self.max_players {
            return Err(RoomError::RoomFull {
                capacity: self.max_players,
            });
        }

        self.players
            .push(Player::new(client_id.clone(), user_name.clone()));

        if self.players.len() == 1 {
            self.enter_waiting_for_players(now, &mut effects);
        } else if self.players.len() == 2 && self.phase() == Phase::WaitingForPlayers {
            self.players.shuffle(&mut self.rng);
            self.enter_waiting_for_start(now, &mut effects);
        }
        if self.phase() == Phase::WaitingForStart && self.players.len() == self.max_players {
            self.players.shuffle(&mut self.rng);
            self.start_game(now, &mut effects);
        }

        self.send_catch_up(&client_id, now, &mut effects);
        self.broadcast_standings(&mut effects);
        self.announce(
            format!("{user_name} joined the party"),
            AnnouncementKind::PlayerJoined,
            &mut effects,
        );
        Ok(effects)
    }

    /// Remove a player for good.
    pub fn leave(&mut self, client_id: &ClientId, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(index) = self.players.iter().position(|p| &p.client_id == client_id) else {
            return effects;
        };
        let player = self.players.remove(index);
        if index < self.next_drawer_index {
            self.next_drawer_index -= 1;
        }
        if self.next_drawer_index >= self.players.len() {
            self.next_drawer_index = 0;
        }

        if self.players.is_empty() {
            tracing::info!("Room '{}' is empty, parking it", self.name);
            self.phase = RoomPhase::WaitingForPlayers;
            self.timer = None;
            effects.push(Effect::CancelTimer);
            return effects;
        }

        if self.players.len() == 1 && self.phase() != Phase::WaitingForPlayers {
            self.enter_waiting_for_players(now, &mut effects);
        } else if self.everybody_guessed() {
            self.finish_round_early(now, &mut effects);
        }

        self.broadcast_standings(&mut effects);
        self.announce(
            format!("{} left the party", player.user_name),
            AnnouncementKind::PlayerLeft,
            &mut effects,
        );
        effects
    }

    /// Flip the online flag. Returns whether the player exists.
    pub fn set_online(&mut self, client_id: &ClientId, online: bool) -> bool {
        match self.players.iter_mut().find(|p| &p.client_id == client_id) {
            Some(player) => {
                player.is_online = online;
                true
            }
            None => false,
        }
    }

    /// Handle a chat line: either a correct guess or a message for everyone.
    pub fn chat(&mut self, client_id: &ClientId, message: String, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(sender) = self.player(client_id) else {
            return effects;
        };

        if self.is_correct_guess(client_id, &message) {
            self.on_correct_guess(client_id, now, &mut effects);
        } else {
            let line = ChatLine {
                from: sender.user_name.clone(),
                room_name: self.name.clone(),
                message,
                timestamp: self.clock.now_millis(),
            };
            effects.push(Effect::broadcast(ServerEvent::Chat(line)));
        }
        effects
    }

    /// Relay a stroke to everybody else while the drawing phase runs.
    pub fn draw(&mut self, client_id: &ClientId, stroke: Stroke) -> Vec<Effect> {
        if !self.contains_client(client_id) {
            return Vec::new();
        }
        match &mut self.phase {
            RoomPhase::GameRunning { strokes, .. } => {
                strokes.push(stroke.clone());
                vec![Effect::Broadcast {
                    event: ServerEvent::DrawData(stroke),
                    except: Some(client_id.clone()),
                }]
            }
            _ => Vec::new(),
        }
    }

    /// The drawer picked the word for this round.
    pub fn choose_word(&mut self, client_id: &ClientId, word: String, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let word = word.trim().to_string();
        let is_drawer = matches!(
            &self.phase,
            RoomPhase::NewRound { drawer, .. } if &drawer.client_id == client_id
        );
        if !is_drawer || word.is_empty() {
            tracing::debug!(
                "Ignoring word choice from '{}' in room '{}' ({:?})",
                client_id,
                self.name,
                self.phase()
            );
            return effects;
        }

        if let RoomPhase::NewRound { drawer, .. } =
            mem::replace(&mut self.phase, RoomPhase::WaitingForPlayers)
        {
            self.enter_game_running(drawer, word, now, &mut effects);
        }
        effects
    }

    /// The phase timer ran out.
    pub fn on_timer_expired(&mut self, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.timer = None;

        match mem::replace(&mut self.phase, RoomPhase::WaitingForPlayers) {
            RoomPhase::WaitingForPlayers => {
                if !self.players.is_empty() {
                    self.enter_waiting_for_players(now, &mut effects);
                }
            }
            RoomPhase::WaitingForStart => self.start_game(now, &mut effects),
            RoomPhase::AfterGame { .. } => self.enter_new_round(now, &mut effects),
            RoomPhase::NewRound { drawer, candidates } => {
                let word = candidates
                    .choose(&mut self.rng)
                    .cloned()
                    .unwrap_or_else(|| self.words.random_word(&mut self.rng));
                tracing::debug!("Drawer '{}' did not choose a word in time", drawer.user_name);
                self.enter_game_running(drawer, word, now, &mut effects);
            }
            RoomPhase::GameRunning {
                drawer,
                word,
                guessed,
                ..
            } => {
                self.enter_after_game(drawer, word, guessed.is_empty(), now, &mut effects);
            }
        }
        effects
    }

    // ----------------------------------------
    // Phase entry actions
    // ----------------------------------------

    fn enter_waiting_for_players(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.phase = RoomPhase::WaitingForPlayers;
        for player in &mut self.players {
            player.is_drawing = false;
        }
        self.arm(now, effects);
    }

    /// The lobby countdown keeps running; only newcomers need the phase.
    fn enter_waiting_for_start(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.phase = RoomPhase::WaitingForStart;
        match self.timer_remaining(now) {
            Some(remaining) => effects.push(Effect::broadcast(ServerEvent::PhaseChange {
                phase: Some(Phase::WaitingForStart),
                remaining,
                drawing_player: None,
            })),
            None => self.arm(now, effects),
        }
    }

    /// Leave the lobby and open the first round.
    fn start_game(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.next_drawer_index = 0;
        self.enter_new_round(now, effects);
    }

    fn enter_new_round(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let Some(drawer) = self.rotate_drawer() else {
            self.phase = RoomPhase::WaitingForPlayers;
            return;
        };
        let candidates = match self.words.pick_words(WORD_CHOICES, &mut self.rng) {
            Ok(words) => words,
            Err(e) => {
                tracing::error!("Room '{}' could not draw candidate words: {}", self.name, e);
                Vec::new()
            }
        };

        self.phase = RoomPhase::NewRound {
            drawer: drawer.clone(),
            candidates: candidates.clone(),
        };
        self.broadcast_standings(effects);
        if !candidates.is_empty() {
            effects.push(Effect::Send {
                to: drawer.client_id,
                event: ServerEvent::NewWords(candidates),
            });
        }
        self.arm(now, effects);
    }

    fn enter_game_running(
        &mut self,
        drawer: Drawer,
        word: String,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        effects.push(Effect::Broadcast {
            event: ServerEvent::GameState {
                drawing_player: drawer.user_name.clone(),
                word: mask_word(&word),
            },
            except: Some(drawer.client_id.clone()),
        });
        effects.push(Effect::Send {
            to: drawer.client_id.clone(),
            event: ServerEvent::GameState {
                drawing_player: drawer.user_name.clone(),
                word: word.clone(),
            },
        });
        tracing::info!(
            "Drawing phase in room '{}' started, it runs for {}s",
            self.name,
            self.rules.drawing.as_secs()
        );

        self.phase = RoomPhase::GameRunning {
            drawer,
            word,
            started_at: now,
            guessed: HashSet::new(),
            strokes: Vec::new(),
        };
        self.arm(now, effects);
    }

    fn enter_after_game(
        &mut self,
        drawer: Drawer,
        word: String,
        nobody_guessed: bool,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if nobody_guessed
            && let Some(player) = self
                .players
                .iter_mut()
                .find(|p| p.client_id == drawer.client_id)
        {
            player.score -= self.rules.penalty_nobody_guessed;
        }

        self.phase = RoomPhase::AfterGame {
            drawer,
            word: word.clone(),
        };
        self.broadcast_standings(effects);
        effects.push(Effect::broadcast(ServerEvent::ChosenWord {
            word,
            room_name: self.name.clone(),
        }));
        self.arm(now, effects);
    }

    // ----------------------------------------
    // Guessing
    // ----------------------------------------

    fn is_correct_guess(&self, client_id: &ClientId, message: &str) -> bool {
        match &self.phase {
            RoomPhase::GameRunning {
                drawer,
                word,
                guessed,
                ..
            } => {
                &drawer.client_id != client_id
                    && !guessed.contains(client_id)
                    && matches_word(message, word)
            }
            _ => false,
        }
    }

    fn on_correct_guess(&mut self, client_id: &ClientId, now: Instant, effects: &mut Vec<Effect>) {
        let RoomPhase::GameRunning {
            drawer,
            started_at,
            guessed,
            ..
        } = &mut self.phase
        else {
            return;
        };
        guessed.insert(client_id.clone());
        let drawer_id = drawer.client_id.clone();

        let drawing_secs = self.rules.drawing.as_secs_f64();
        let elapsed_secs = now.saturating_duration_since(*started_at).as_secs_f64();
        let fraction_left = if drawing_secs > 0.0 {
            (1.0 - elapsed_secs / drawing_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let points = self.rules.guess_score_base
            + (self.rules.guess_score_time_bonus as f64 * fraction_left) as i64;
        let non_drawers = self
            .players
            .iter()
            .filter(|p| p.client_id != drawer_id)
            .count()
            .max(1) as i64;
        let drawer_points = self.rules.guess_score_drawer / non_drawers;

        let mut guesser_name = None;
        for player in &mut self.players {
            if &player.client_id == client_id {
                player.score += points;
                guesser_name = Some(player.user_name.clone());
            } else if player.client_id == drawer_id {
                player.score += drawer_points;
            }
        }

        self.broadcast_standings(effects);
        if let Some(name) = guesser_name {
            self.announce(
                format!("{name} has guessed it!"),
                AnnouncementKind::PlayerGuessedWord,
                effects,
            );
        }
        if self.everybody_guessed() {
            self.finish_round_early(now, effects);
        }
    }

    /// Every player still present, except the drawer, has guessed the word.
    fn everybody_guessed(&self) -> bool {
        let RoomPhase::GameRunning {
            drawer, guessed, ..
        } = &self.phase
        else {
            return false;
        };
        let mut guessers = self
            .players
            .iter()
            .filter(|p| p.client_id != drawer.client_id)
            .peekable();
        guessers.peek().is_some() && guessers.all(|p| guessed.contains(&p.client_id))
    }

    fn finish_round_early(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        self.announce(
            "Everybody guessed it!".to_string(),
            AnnouncementKind::EverybodyGuessedIt,
            effects,
        );
        if let RoomPhase::GameRunning {
            drawer,
            word,
            guessed,
            ..
        } = mem::replace(&mut self.phase, RoomPhase::WaitingForPlayers)
        {
            self.enter_after_game(drawer, word, guessed.is_empty(), now, effects);
        }
    }

    // ----------------------------------------
    // Helpers
    // ----------------------------------------

    fn rotate_drawer(&mut self) -> Option<Drawer> {
        for player in &mut self.players {
            player.is_drawing = false;
        }
        if self.players.is_empty() {
            return None;
        }
        if self.next_drawer_index >= self.players.len() {
            self.next_drawer_index = 0;
        }

        let player = &mut self.players[self.next_drawer_index];
        player.is_drawing = true;
        let drawer = Drawer {
            client_id: player.client_id.clone(),
            user_name: player.user_name.clone(),
        };
        self.next_drawer_index = (self.next_drawer_index + 1) % self.players.len();
        Some(drawer)
    }

    fn drawer_name(&self) -> Option<UserName> {
        self.phase.drawer().map(|d| d.user_name.clone())
    }

    /// Start the timer of the current phase and announce it.
    fn arm(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let duration = self.rules.duration_of(self.phase.kind());
        self.timer = Some(PhaseTimer {
            armed_at: now,
            duration,
        });
        effects.push(Effect::broadcast(ServerEvent::PhaseChange {
            phase: Some(self.phase.kind()),
            remaining: duration,
            drawing_player: self.drawer_name(),
        }));
        effects.push(Effect::ArmTimer { duration });
    }

    /// What a (re)joining player missed.
    fn send_catch_up(&self, client_id: &ClientId, now: Instant, effects: &mut Vec<Effect>) {
        let is_drawer = self
            .phase
            .drawer()
            .is_some_and(|d| &d.client_id == client_id);

        match &self.phase {
            RoomPhase::GameRunning {
                drawer,
                word,
                strokes,
                ..
            } => {
                effects.push(Effect::Send {
                    to: client_id.clone(),
                    event: ServerEvent::GameState {
                        drawing_player: drawer.user_name.clone(),
                        word: if is_drawer { word.clone() } else { mask_word(word) },
                    },
                });
                if !strokes.is_empty() {
                    effects.push(Effect::Send {
                        to: client_id.clone(),
                        event: ServerEvent::CurRoundDrawInfo(strokes.clone()),
                    });
                }
            }
            RoomPhase::AfterGame { drawer, word } => {
                effects.push(Effect::Send {
                    to: client_id.clone(),
                    event: ServerEvent::GameState {
                        drawing_player: drawer.user_name.clone(),
                        word: word.clone(),
                    },
                });
            }
            // a drawer coming back still has to pick a word
            RoomPhase::NewRound { candidates, .. } if is_drawer && !candidates.is_empty() => {
                effects.push(Effect::Send {
                    to: client_id.clone(),
                    event: ServerEvent::NewWords(candidates.clone()),
                });
            }
            _ => {}
        }

        effects.push(Effect::Send {
            to: client_id.clone(),
            event: ServerEvent::PhaseChange {
                phase: Some(self.phase.kind()),
                remaining: self.timer_remaining(now).unwrap_or_default(),
                drawing_player: self.drawer_name(),
            },
        });
    }

    /// Recompute ranks and broadcast the standings, best score first.
    fn broadcast_standings(&mut self, effects: &mut Vec<Effect>) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by(|&a, &b| self.players[b].score.cmp(&self.players[a].score));

        let mut standings = Vec::with_capacity(order.len());
        for (position, &index) in order.iter().enumerate() {
            let player = &mut self.players[index];
            player.rank = position as u32 + 1;
            standings.push(PlayerStanding {
                user_name: player.user_name.clone(),
                is_drawing: player.is_drawing,
                score: player.score,
                rank: player.rank,
            });
        }
        effects.push(Effect::broadcast(ServerEvent::PlayerList(standings)));
    }

    fn announce(&self, message: String, kind: AnnouncementKind, effects: &mut Vec<Effect>) {
        effects.push(Effect::broadcast(ServerEvent::Announcement(Announcement {
            message,
            timestamp: self.clock.now_millis(),
            kind,
        })));
    }
}
