//! Messages exchanged between the game server and its clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{Outcome, ServerError, Shot};
use crate::game::GameView;
use crate::model::{Game, GameId, Identity, PlayerId, ShipId};

pub use crate::config::PROTOCOL_VERSION;

/// Frame payload on every transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// First message of a session, naming the caller.
    Handshake { version: u32, identity: Identity },
    /// Server's answer to the handshake, carrying the caller's player id.
    HandshakeAck { version: u32, player_id: PlayerId },
    Request { seq: u64, request: Request },
    /// Answer to the request with the same `seq`.
    Response { seq: u64, response: Response },
    /// Orderly end of the session.
    Goodbye,
}

/// One public operation, invoked on behalf of the session's caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    SetName { name: String },
    CreateGame { opponent_id: PlayerId },
    StartGame { game_id: GameId },
    PlaceShip {
        game_id: GameId,
        x: u32,
        y: u32,
        length: u32,
        horizontal: bool,
    },
    FireAt { game_id: GameId, x: u32, y: u32 },
    GameView { game_id: GameId },
    ListGames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Done,
    GameCreated(GameId),
    Started(Outcome<()>),
    ShipPlaced(Outcome<ShipId>),
    Shot(Outcome<Shot>),
    View(GameView),
    Games(Vec<Game>),
    Failed(Failure),
}

/// An operation that aborted, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Failure {
    #[error("player not found")]
    PlayerNotFound,
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for Failure {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::PlayerNotFound => Failure::PlayerNotFound,
            ServerError::GameNotFound(id) => Failure::GameNotFound(id),
            ServerError::Store(e) => Failure::Internal(e.to_string()),
        }
    }
}
