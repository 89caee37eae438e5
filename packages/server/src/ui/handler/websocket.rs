//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::{sync::mpsc, time::Instant};

use crate::{
    domain::{ClientId, ConnectionId},
    infrastructure::dto::websocket::ClientMessage,
    ui::state::AppState,
    usecase::GameAction,
};

use super::heartbeat::Heartbeat;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub client_id: String,
}

/// What the reader does after a frame was handled.
enum Flow {
    Continue,
    Disconnect,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> ClientId (Domain Model)
    let client_id = match ClientId::try_from(query.client_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid client_id '{}': {}", query.client_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, client_id)))
}

/// Spawns a task that forwards queued frames to the WebSocket and pings the peer.
///
/// The task ends when the socket fails, when too many pings went unanswered,
/// or when the channel is closed because the connection was unregistered.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    heartbeat: Arc<Heartbeat>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if !heartbeat.probe() {
                        tracing::info!(
                            "{} pings went unanswered, closing connection",
                            heartbeat.missed().saturating_sub(1)
                        );
                        break;
                    }
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, client_id: ClientId) {
    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state
        .connect_player_usecase
        .execute(client_id.clone(), tx)
        .await;

    let (sender, mut receiver) = socket.split();
    let heartbeat = Arc::new(Heartbeat::new(state.heartbeat.max_missed));

    // Spawn a task to push queued messages to this client
    let mut send_task = pusher_loop(rx, sender, heartbeat.clone(), state.heartbeat.interval);

    // Spawn a task to receive messages from this client
    let reader_state = state.clone();
    let reader_client_id = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", reader_client_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let flow =
                        dispatch(&reader_state, &reader_client_id, connection_id, &text).await;
                    if let Flow::Disconnect = flow {
                        return true;
                    }
                }
                Message::Pong(_) => heartbeat.pong(),
                Message::Close(_) => {
                    tracing::info!("Client '{}' closed the connection", reader_client_id);
                    break;
                }
                _ => {}
            }
        }
        false
    });

    // If any one of the tasks completes, abort the other
    let requested = tokio::select! {
        requested = &mut recv_task => {
            send_task.abort();
            requested.unwrap_or(false)
        }
        _ = &mut send_task => {
            recv_task.abort();
            false
        }
    };

    let outcome = state
        .disconnect_player_usecase
        .execute(&client_id, connection_id, requested)
        .await;
    tracing::info!(
        "Connection '{}' of client '{}' ended ({:?})",
        connection_id,
        client_id,
        outcome
    );
}

/// Decode one text frame and route it.
async fn dispatch(
    state: &AppState,
    client_id: &ClientId,
    connection_id: ConnectionId,
    text: &str,
) -> Flow {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Dropping malformed message from '{}': {}", client_id, e);
            return Flow::Continue;
        }
    };

    let (room_name, action) = match message {
        ClientMessage::JoinRoomHandshake(handshake) => {
            // a connection only ever speaks for the client it was opened for
            if handshake.client_id != client_id.as_str() {
                tracing::warn!(
                    "Dropping handshake naming client '{}' on the connection of '{}'",
                    handshake.client_id,
                    client_id
                );
                return Flow::Continue;
            }
            if let Err(e) = state
                .join_room_usecase
                .execute(
                    client_id,
                    connection_id,
                    handshake.user_name,
                    handshake.room_name,
                )
                .await
            {
                tracing::info!("Client '{}' could not join: {}", client_id, e);
            }
            return Flow::Continue;
        }
        ClientMessage::DisconnectRequest => return Flow::Disconnect,
        ClientMessage::DrawData(data) => (data.room_name.clone(), GameAction::Draw(data.into())),
        ClientMessage::ChatMessage(chat) => (chat.room_name, GameAction::Chat(chat.message)),
        ClientMessage::ChosenWord(chosen) => {
            (chosen.room_name, GameAction::ChooseWord(chosen.chosen_word))
        }
    };

    if let Err(e) = state
        .game_action_usecase
        .execute(client_id, room_name, action)
        .await
    {
        tracing::debug!("Action of client '{}' was not applied: {}", client_id, e);
    }
    Flow::Continue
}
