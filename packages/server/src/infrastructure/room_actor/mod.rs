//! Room actor: one task per room that owns the game state.
//!
//! ## 責務
//!
//! - ルームへの全ての操作をコマンドとして直列に処理する
//! - フェーズタイマーを1つだけ保持し、ティック通知と満了を処理する
//! - `Room` が返した `Effect` を `MessagePusher` で配送する
//! - 各コマンド処理後に `RoomSnapshot` を丸ごと差し替えて公開する

pub mod timer;

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, sleep_until},
};

use crate::{
    domain::{
        ClientId, Effect, MessagePushError, MessagePusher, Room, RoomError, RoomName,
        RoomSnapshot, ServerEvent, Stroke, UserName,
    },
    infrastructure::dto::conversion::to_server_message,
};

pub use timer::{TickSchedule, TimerStep};

/// Commands processed by a room actor.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        client_id: ClientId,
        user_name: UserName,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        client_id: ClientId,
    },
    SetOnline {
        client_id: ClientId,
        online: bool,
    },
    Chat {
        client_id: ClientId,
        message: String,
    },
    Draw {
        client_id: ClientId,
        stroke: Stroke,
    },
    ChooseWord {
        client_id: ClientId,
        word: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomCommandError {
    #[error(transparent)]
    Rejected(#[from] RoomError),

    #[error("room actor has stopped")]
    Closed,
}

/// Cheap, cloneable handle to a running room actor.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: RoomName,
    max_players: usize,
    created_at: i64,
    commands: mpsc::UnboundedSender<RoomCommand>,
    snapshot: watch::Receiver<RoomSnapshot>,
}

impl RoomHandle {
    /// Spawn the actor task for `room`.
    ///
    /// `created_at` is the wall-clock creation time in Unix milliseconds.
    pub fn spawn(room: Room, pusher: Arc<dyn MessagePusher>, created_at: i64) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(room.snapshot());
        let handle = Self {
            name: room.name().clone(),
            max_players: room.max_players(),
            created_at,
            commands: commands_tx,
            snapshot: snapshot_rx,
        };

        let actor = RoomActor {
            room,
            pusher,
            commands: commands_rx,
            snapshot: snapshot_tx,
            schedule: None,
        };
        tokio::spawn(actor.run());
        handle
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Latest published state of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Whether the actor task is still running.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    pub async fn join(
        &self,
        client_id: ClientId,
        user_name: UserName,
    ) -> Result<(), RoomCommandError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Join {
            client_id,
            user_name,
            reply,
        })?;
        response.await.map_err(|_| RoomCommandError::Closed)??;
        Ok(())
    }

    pub fn leave(&self, client_id: ClientId) -> Result<(), RoomCommandError> {
        self.send(RoomCommand::Leave { client_id })
    }

    pub fn set_online(&self, client_id: ClientId, online: bool) -> Result<(), RoomCommandError> {
        self.send(RoomCommand::SetOnline { client_id, online })
    }

    pub fn chat(&self, client_id: ClientId, message: String) -> Result<(), RoomCommandError> {
        self.send(RoomCommand::Chat { client_id, message })
    }

    pub fn draw(&self, client_id: ClientId, stroke: Stroke) -> Result<(), RoomCommandError> {
        self.send(RoomCommand::Draw { client_id, stroke })
    }

    pub fn choose_word(&self, client_id: ClientId, word: String) -> Result<(), RoomCommandError> {
        self.send(RoomCommand::ChooseWord { client_id, word })
    }

    pub fn shutdown(&self) {
        // the actor may already be gone
        let _ = self.commands.send(RoomCommand::Shutdown);
    }

    fn send(&self, command: RoomCommand) -> Result<(), RoomCommandError> {
        self.commands
            .send(command)
            .map_err(|_| RoomCommandError::Closed)
    }
}

struct RoomActor {
    room: Room,
    pusher: Arc<dyn MessagePusher>,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    snapshot: watch::Sender<RoomSnapshot>,
    schedule: Option<TickSchedule>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!("Room '{}' started", self.room.name());

        loop {
            let wake_at = self.schedule.as_ref().map(TickSchedule::next_deadline);
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command).await,
                },
                _ = wait_until(wake_at) => self.on_tick().await,
            }
            self.publish();
        }

        tracing::info!("Room '{}' stopped", self.room.name());
    }

    async fn handle(&mut self, command: RoomCommand) {
        let now = Instant::now();
        let effects = match command {
            RoomCommand::Join {
                client_id,
                user_name,
                reply,
            } => match self.room.join(client_id.clone(), user_name, now) {
                Ok(effects) => {
                    // the caller observes the joined state once the reply arrives
                    self.execute(effects, now).await;
                    self.publish();
                    let _ = reply.send(Ok(()));
                    return;
                }
                Err(e) => {
                    tracing::info!(
                        "Client '{}' could not join room '{}': {}",
                        client_id,
                        self.room.name(),
                        e
                    );
                    let _ = reply.send(Err(e));
                    return;
                }
            },
            RoomCommand::Leave { client_id } => self.room.leave(&client_id, now),
            RoomCommand::SetOnline { client_id, online } => {
                self.room.set_online(&client_id, online);
                return;
            }
            RoomCommand::Chat { client_id, message } => self.room.chat(&client_id, message, now),
            RoomCommand::Draw { client_id, stroke } => self.room.draw(&client_id, stroke),
            RoomCommand::ChooseWord { client_id, word } => {
                self.room.choose_word(&client_id, word, now)
            }
            RoomCommand::Shutdown => return,
        };
        self.execute(effects, now).await;
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.room.snapshot());
    }

    async fn on_tick(&mut self) {
        let now = Instant::now();
        let Some(schedule) = self.schedule.as_mut() else {
            return;
        };

        match schedule.advance(now) {
            TimerStep::Remaining(remaining) => {
                let event = self.room.tick_notification(remaining);
                self.execute(vec![Effect::broadcast(event)], now).await;
            }
            TimerStep::Expired => {
                self.schedule = None;
                tracing::debug!(
                    "Timer of room '{}' expired in {:?}",
                    self.room.name(),
                    self.room.phase()
                );
                let effects = self.room.on_timer_expired(now);
                self.execute(effects, now).await;
            }
        }
    }

    async fn execute(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::Send { to, event } => self.send(&to, event).await,
                Effect::Broadcast { event, except } => self.broadcast(event, except.as_ref()).await,
                Effect::ArmTimer { duration } => {
                    let tick_interval = self.room.rules().tick_interval;
                    self.schedule = Some(TickSchedule::new(now, duration, tick_interval));
                }
                Effect::CancelTimer => self.schedule = None,
            }
        }
    }

    async fn send(&mut self, to: &ClientId, event: ServerEvent) {
        let Some(json) = to_server_message(event, self.room.name()).to_json() else {
            return;
        };
        match self.pusher.push_to(to, &json).await {
            Ok(()) => {}
            Err(MessagePushError::ClientNotFound(_)) => {
                tracing::trace!("Client '{}' has no connection, dropping message", to);
            }
            Err(e @ MessagePushError::PushFailed(_)) => {
                tracing::warn!("Failed to push to client '{}': {}", to, e);
                self.room.set_online(to, false);
            }
        }
    }

    async fn broadcast(&mut self, event: ServerEvent, except: Option<&ClientId>) {
        let targets: Vec<ClientId> = self
            .room
            .players()
            .iter()
            .filter(|p| p.is_online && Some(&p.client_id) != except)
            .map(|p| p.client_id.clone())
            .collect();
        if targets.is_empty() {
            return;
        }
        let Some(json) = to_server_message(event, self.room.name()).to_json() else {
            return;
        };

        for client_id in self.pusher.broadcast(&targets, &json).await {
            self.room.set_online(&client_id, false);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, GameRules, Phase, WordProvider},
        infrastructure::{
            dto::websocket::{PhaseChangeDto, ServerMessage},
            message_pusher::WebSocketMessagePusher,
        },
    };
    use rand::{SeedableRng, rngs::StdRng};
    use sketchroom_shared::time::FixedClock;
    use std::time::Duration;

    fn cid(s: &str) -> ClientId {
        ClientId::new(s.to_string()).unwrap()
    }

    fn uname(s: &str) -> UserName {
        UserName::new(s.to_string()).unwrap()
    }

    fn spawn_room(max_players: usize, pusher: Arc<WebSocketMessagePusher>) -> RoomHandle {
        let words = WordProvider::new(["apple", "banana", "cherry"]).unwrap();
        let room = Room::new(
            RoomName::new("lobby".to_string()).unwrap(),
            max_players,
            GameRules::default(),
            Arc::new(words),
            Arc::new(FixedClock::new(0)),
            StdRng::seed_from_u64(1),
        );
        RoomHandle::spawn(room, pusher, 0)
    }

    async fn connect(
        pusher: &WebSocketMessagePusher,
        name: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        pusher
            .register_client(cid(name), ConnectionId::generate(), tx)
            .await;
        rx
    }

    async fn next_matching(
        rx: &mut mpsc::UnboundedReceiver<String>,
        pred: impl Fn(&ServerMessage) -> bool,
    ) -> ServerMessage {
        loop {
            let frame = rx.recv().await.unwrap();
            let message: ServerMessage = serde_json::from_str(&frame).unwrap();
            if pred(&message) {
                return message;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_every_second() {
        // テスト項目: タイマー稼働中は1秒ごとに残り時間が通知される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let mut alice_rx = connect(&pusher, "alice").await;
        let room = spawn_room(4, pusher.clone());
        let start = Instant::now();

        // when (操作):
        room.join(cid("alice"), uname("alice")).await.unwrap();

        // then (期待する結果):
        let tick = next_matching(&mut alice_rx, |m| {
            matches!(m, ServerMessage::PhaseChange(PhaseChangeDto { phase: None, .. }))
        })
        .await;
        assert_eq!(
            tick,
            ServerMessage::PhaseChange(PhaseChangeDto {
                phase: None,
                time: 9_000,
                drawing_player: None,
            })
        );
        assert_eq!(Instant::now() - start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lobby_timer_rearms_after_expiry() {
        // テスト項目: 1人のまま待機タイマーが満了すると同じフェーズのタイマーが再開される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let mut alice_rx = connect(&pusher, "alice").await;
        let room = spawn_room(4, pusher.clone());
        let start = Instant::now();
        room.join(cid("alice"), uname("alice")).await.unwrap();
        let is_lobby_entry = |m: &ServerMessage| {
            matches!(
                m,
                ServerMessage::PhaseChange(PhaseChangeDto {
                    phase: Some(Phase::WaitingForPlayers),
                    time: 10_000,
                    ..
                })
            )
        };
        next_matching(&mut alice_rx, is_lobby_entry).await;

        // when (操作): catch-up 分を読み飛ばし、次のフェーズ開始通知を待つ
        let mut entries = 0;
        while entries < 2 {
            next_matching(&mut alice_rx, is_lobby_entry).await;
            entries += 1;
        }

        // then (期待する結果):
        assert_eq!(Instant::now() - start, Duration::from_secs(10));
        assert_eq!(room.snapshot().phase, Phase::WaitingForPlayers);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_room_sends_candidates_to_drawer() {
        // テスト項目: 定員2の部屋に2人が参加すると描き手に候補の単語が届く
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let mut alice_rx = connect(&pusher, "alice").await;
        let mut bob_rx = connect(&pusher, "bob").await;
        let room = spawn_room(2, pusher.clone());

        // when (操作):
        room.join(cid("alice"), uname("alice")).await.unwrap();
        room.join(cid("bob"), uname("bob")).await.unwrap();

        // then (期待する結果):
        let entry = next_matching(&mut bob_rx, |m| {
            matches!(
                m,
                ServerMessage::PhaseChange(PhaseChangeDto {
                    phase: Some(Phase::NewRound),
                    ..
                })
            )
        })
        .await;
        let ServerMessage::PhaseChange(PhaseChangeDto {
            drawing_player: Some(drawer),
            ..
        }) = entry
        else {
            panic!("expected a drawer");
        };
        let drawer_rx = if drawer == "alice" {
            &mut alice_rx
        } else {
            &mut bob_rx
        };
        let words = next_matching(drawer_rx, |m| matches!(m, ServerMessage::NewWords { .. })).await;
        let ServerMessage::NewWords { new_words } = words else {
            unreachable!();
        };
        assert_eq!(new_words.len(), 3);
        assert_eq!(room.snapshot().phase, Phase::NewRound);
        assert_eq!(room.snapshot().player_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_word_choice_replaces_choose_timer() {
        // テスト項目: 早めに単語を選ぶと単語選択のタイマーは破棄され、描画時間がその時点から数えられる
        // given (前提条件): 定員2で NEW_ROUND に入った部屋
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let mut alice_rx = connect(&pusher, "alice").await;
        let _bob_rx = connect(&pusher, "bob").await;
        let room = spawn_room(2, pusher.clone());
        let start = Instant::now();
        room.join(cid("alice"), uname("alice")).await.unwrap();
        room.join(cid("bob"), uname("bob")).await.unwrap();
        let entry = next_matching(&mut alice_rx, |m| {
            matches!(
                m,
                ServerMessage::PhaseChange(PhaseChangeDto {
                    phase: Some(Phase::NewRound),
                    ..
                })
            )
        })
        .await;
        let ServerMessage::PhaseChange(PhaseChangeDto {
            drawing_player: Some(drawer),
            ..
        }) = entry
        else {
            panic!("expected a drawer");
        };

        // when (操作): 5秒後に描き手が単語を選ぶ
        tokio::time::sleep_until(start + Duration::from_secs(5)).await;
        room.choose_word(cid(&drawer), "apple".to_string()).unwrap();

        // then (期待する結果): 元の20秒の期限を過ぎても描画は続く
        tokio::time::sleep_until(start + Duration::from_secs(25)).await;
        assert_eq!(room.snapshot().phase, Phase::GameRunning);

        // 選択から60秒で結果表示に移る
        tokio::time::sleep_until(start + Duration::from_secs(66)).await;
        assert_eq!(room.snapshot().phase, Phase::AfterGame);
    }

    #[tokio::test]
    async fn test_rejected_join_is_reported() {
        // テスト項目: 定員超過の参加はエラーとして呼び出し元に返される
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room = spawn_room(2, pusher.clone());
        room.join(cid("alice"), uname("alice")).await.unwrap();
        room.join(cid("bob"), uname("bob")).await.unwrap();

        // when (操作):
        let result = room.join(cid("charlie"), uname("charlie")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomCommandError::Rejected(RoomError::RoomFull { capacity: 2 }))
        );
    }

    #[tokio::test]
    async fn test_commands_fail_after_shutdown() {
        // テスト項目: シャットダウン後のコマンドは Closed になる
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let room = spawn_room(4, pusher);

        // when (操作):
        room.shutdown();
        let result = room.join(cid("alice"), uname("alice")).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomCommandError::Closed));
        assert!(!room.is_running());
    }

    #[tokio::test]
    async fn test_unreachable_player_is_marked_offline() {
        // テスト項目: 接続が閉じたプレイヤーへの配送に失敗するとオフラインになる
        // given (前提条件):
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let alice_rx = connect(&pusher, "alice").await;
        let _bob_rx = connect(&pusher, "bob").await;
        let room = spawn_room(4, pusher.clone());
        drop(alice_rx);

        // when (操作):
        room.join(cid("alice"), uname("alice")).await.unwrap();
        room.join(cid("bob"), uname("bob")).await.unwrap();

        // then (期待する結果):
        let snapshot = room.snapshot();
        let online: Vec<_> = snapshot
            .players
            .iter()
            .map(|p| (p.user_name.as_str().to_string(), p.is_online))
            .collect();
        assert!(online.contains(&("alice".to_string(), false)));
        assert!(online.contains(&("bob".to_string(), true)));
    }
}
