//! Common types for the game server: errors, rejection reasons and shot results.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{GameId, PlayerId, ShipId};

/// Result of a shot against the opponent's board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotResult {
    /// No unhit ship segment at the target.
    Miss,
    /// Struck a ship segment without sinking anything.
    Hit,
    /// Struck a ship segment and sank the listed ships.
    Sink(Vec<ShipId>),
    /// The tile had already been hit; nothing changed but the turn is spent.
    AlreadyHit,
}

/// What happens to the game after a resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    /// Play passes to this player.
    Next(PlayerId),
    /// The shooter sank the last opposing ship.
    Won(PlayerId),
}

/// A shot that was accepted and resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub result: ShotResult,
    pub turn: Turn,
}

/// Why a rule-governed operation left every relation untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Rejection {
    #[error("game does not exist")]
    GameMissing,
    #[error("game has already started")]
    GameStarted,
    #[error("game has already ended")]
    GameEnded,
    #[error("it is not the caller's turn")]
    NotYourTurn,
    #[error("caller is not playing in this game")]
    NotParticipant,
}

/// Outcome of an operation that may be refused by the game rules.
///
/// A rejected operation is still a successful call: the transaction commits
/// with no writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome<T> {
    Applied(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(reason) => Some(*reason),
        }
    }
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} row {key} already exists")]
    Duplicate { table: &'static str, key: String },
    #[error("{table} row {key} does not exist")]
    RowNotFound { table: &'static str, key: String },
    #[error("{table} ids exhausted")]
    IdsExhausted { table: &'static str },
    #[error("store lock poisoned")]
    Poisoned,
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Fatal conditions that abort an operation's transaction.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("player not found")]
    PlayerNotFound,
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
