//! Sketchroom game server.
//!
//! Hosts drawing-and-guessing rooms over WebSocket and exposes a small HTTP
//! API to create, list and check rooms.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin sketchroom-server -- --word-list words.txt
//! cargo run --bin sketchroom-server -- --word-list words.txt --host 0.0.0.0 --port 3000
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use sketchroom_server::{
    config::ServerConfig,
    domain::{GameRules, WordProvider},
    ui::{Server, state::AppState},
};
use sketchroom_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "sketchroom-server")]
#[command(about = "Real-time drawing and guessing game server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Line-delimited file with the words players have to draw
    #[arg(short = 'w', long)]
    word_list: PathBuf,

    /// Largest `maxPlayers` a room may be created with
    #[arg(long, default_value = "8")]
    max_room_size: usize,

    /// Lobby countdown before a game starts
    #[arg(long, default_value = "10")]
    time_to_start_secs: u64,

    /// Time the drawer has to pick a word
    #[arg(long, default_value = "20")]
    choose_word_secs: u64,

    /// Length of the drawing phase
    #[arg(long, default_value = "60")]
    drawing_secs: u64,

    /// How long the word is revealed after a round
    #[arg(long, default_value = "10")]
    results_secs: u64,

    /// Points the drawer loses when nobody guessed the word
    #[arg(long, default_value = "50")]
    penalty: i64,

    /// Seconds an offline player keeps its seat (0 removes immediately)
    #[arg(long, default_value = "60")]
    reconnect_grace_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: self.host,
            port: self.port,
            max_room_size: self.max_room_size,
            rules: GameRules {
                time_to_start: Duration::from_secs(self.time_to_start_secs),
                choose_word: Duration::from_secs(self.choose_word_secs),
                drawing: Duration::from_secs(self.drawing_secs),
                results: Duration::from_secs(self.results_secs),
                penalty_nobody_guessed: self.penalty,
                ..defaults.rules
            },
            reconnect_grace: Duration::from_secs(self.reconnect_grace_secs),
            heartbeat: defaults.heartbeat,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Load the vocabulary once; every room draws from it
    let words = match std::fs::read_to_string(&args.word_list)
        .map_err(|e| e.to_string())
        .and_then(|contents| WordProvider::from_lines(&contents).map_err(|e| e.to_string()))
    {
        Ok(words) => words,
        Err(e) => {
            tracing::error!("Failed to load word list {}: {}", args.word_list.display(), e);
            std::process::exit(1);
        }
    };
    tracing::info!("Loaded {} words", words.len());

    let config = args.into_config();
    let state = AppState::from_config(&config, Arc::new(words), Arc::new(SystemClock));

    let server = Server::new(Arc::new(state));
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
