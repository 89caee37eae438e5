//! UseCase layer: one struct per operation, wired into `AppState`.

pub mod connect_player;
pub mod create_room;
pub mod disconnect_player;
pub mod error;
pub mod game_action;
pub mod get_rooms;
pub mod join_room;
mod notify;

pub use connect_player::ConnectPlayerUseCase;
pub use create_room::{CreateRoomUseCase, MIN_PLAYERS};
pub use disconnect_player::{DisconnectOutcome, DisconnectPlayerUseCase};
pub use error::{CreateRoomError, GameActionError, JoinRoomError};
pub use game_action::{GameAction, GameActionUseCase};
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
