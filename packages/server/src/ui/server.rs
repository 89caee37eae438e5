//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_room, debug_room_state, get_rooms, health_check, join_room, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Drawing game server
///
/// # Example
///
/// ```ignore
/// let state = AppState::from_config(&config, words, Arc::new(SystemClock));
/// Server::new(Arc::new(state)).run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Build the router with every endpoint.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/draw", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/createRoom", post(create_room))
            .route("/api/getRooms", get(get_rooms))
            .route("/api/joinRoom", get(join_room))
            .route("/api/health", get(health_check))
            .route("/debug/rooms/{room_name}", get(debug_room_state))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves, then stop
    /// every room.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.state.registry.shutdown().await;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Run the game server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Sketchroom server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/draw?client_id=<id>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }
}
