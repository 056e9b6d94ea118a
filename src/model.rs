//! Persisted relations shared by every operation.
//!
//! Rows are plain data. Ids are assigned by the store: inserting a row whose
//! id is `0` gives it the next value of that relation's sequence.

use core::fmt;

use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type GameId = u32;
pub type TileId = u32;
pub type ShipId = u32;

/// Opaque key presented by the invocation layer for the calling client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live (or archived) player record per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub identity: Identity,
    pub player_id: PlayerId,
    pub name: String,
}

impl Player {
    /// A fresh, unnamed player awaiting an id from the store.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            player_id: 0,
            name: String::new(),
        }
    }
}

/// Lifecycle position of a game, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Unstarted,
    InProgress,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: GameId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub current_turn_id: PlayerId,
    pub game_started: bool,
    pub game_ended: bool,
    pub winner_id: Option<PlayerId>,
}

impl Game {
    /// A new unstarted game in which `creator` moves first.
    pub fn new(creator: PlayerId, opponent: PlayerId) -> Self {
        Self {
            game_id: 0,
            player1_id: creator,
            player2_id: opponent,
            current_turn_id: creator,
            game_started: false,
            game_ended: false,
            winner_id: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.game_ended {
            GamePhase::Ended
        } else if self.game_started {
            GamePhase::InProgress
        } else {
            GamePhase::Unstarted
        }
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        player == self.player1_id || player == self.player2_id
    }

    /// The other side of the game from `player`'s point of view.
    pub fn opponent_of(&self, player: PlayerId) -> PlayerId {
        if player == self.player1_id {
            self.player2_id
        } else {
            self.player1_id
        }
    }
}

/// One coordinate of a fleet owner's board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTile {
    pub tile_id: TileId,
    pub game_id: GameId,
    /// Owner of the fleet this tile belongs to, never the shooter.
    pub owner_id: PlayerId,
    /// Ship placed over this tile, when the tile was laid down for one.
    pub ship_id: Option<ShipId>,
    pub x: u32,
    pub y: u32,
    pub has_ship: bool,
    pub hit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub ship_id: ShipId,
    pub game_id: GameId,
    pub owner_id: PlayerId,
    pub length: u32,
    pub hit_count: u32,
    pub sunk: bool,
}

impl Ship {
    pub fn new(game_id: GameId, owner_id: PlayerId, length: u32) -> Self {
        Self {
            ship_id: 0,
            game_id,
            owner_id,
            length,
            hit_count: 0,
            sunk: false,
        }
    }

    /// Credit one hit. Returns `true` when this hit sank the ship.
    pub fn take_hit(&mut self) -> bool {
        self.hit_count = self.hit_count.saturating_add(1).min(self.length);
        if !self.sunk && self.hit_count >= self.length {
            self.sunk = true;
            return true;
        }
        false
    }
}

/// Orientation of a ship run on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_horizontal(horizontal: bool) -> Self {
        if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Coordinate of the `i`-th segment of a run starting at (`x`, `y`).
    pub fn step(self, x: u32, y: u32, i: u32) -> (u32, u32) {
        match self {
            Orientation::Horizontal => (x.wrapping_add(i), y),
            Orientation::Vertical => (x, y.wrapping_add(i)),
        }
    }
}
