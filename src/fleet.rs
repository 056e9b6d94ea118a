//! Fleet placement and a random fleet layout for automated players.

use std::collections::HashSet;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{Outcome, Rejection, ServerError};
use crate::model::{BoardTile, GameId, Identity, Orientation, Ship, ShipId};
use crate::player::resolve_caller;
use crate::store::Transaction;

/// Request to lay one ship down as a straight run of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub x: u32,
    pub y: u32,
    pub length: u32,
    pub horizontal: bool,
}

impl ShipPlacement {
    pub fn orientation(&self) -> Orientation {
        Orientation::from_horizontal(self.horizontal)
    }

    /// Coordinates covered by the run, starting at (`x`, `y`).
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (x, y, orientation) = (self.x, self.y, self.orientation());
        (0..self.length).map(move |i| orientation.step(x, y, i))
    }
}

/// Record a ship and its tiles for the caller while the game is unstarted.
///
/// Bounds, overlap and length are not checked.
pub fn place_ship<T: Transaction>(
    tx: &mut T,
    caller: &Identity,
    game_id: GameId,
    placement: ShipPlacement,
) -> Result<Outcome<ShipId>, ServerError> {
    let player = resolve_caller(tx, caller)?;
    let rejection = match tx.find_game(game_id) {
        None => Some(Rejection::GameMissing),
        Some(game) if game.game_started => Some(Rejection::GameStarted),
        Some(_) => None,
    };
    if let Some(reason) = rejection {
        debug!(
            "placement by player {} in game {} ignored: {}",
            player.player_id, game_id, reason
        );
        return Ok(Outcome::Rejected(reason));
    }

    let ship = tx.insert_ship(Ship::new(game_id, player.player_id, placement.length))?;
    for (x, y) in placement.cells() {
        tx.insert_tile(BoardTile {
            tile_id: 0,
            game_id,
            owner_id: player.player_id,
            ship_id: Some(ship.ship_id),
            x,
            y,
            has_ship: true,
            hit: false,
        })?;
    }
    info!(
        "player {} placed ship {} (length {}) at ({}, {}) {:?} in game {}",
        player.player_id,
        ship.ship_id,
        placement.length,
        placement.x,
        placement.y,
        placement.orientation(),
        game_id
    );
    Ok(Outcome::Applied(ship.ship_id))
}

/// Lay out ships of the given lengths on a `size`×`size` board without overlap.
///
/// Returns `None` if some ship could not be fitted after repeated attempts.
pub fn random_fleet<R: Rng>(rng: &mut R, size: u32, lengths: &[u32]) -> Option<Vec<ShipPlacement>> {
    let mut occupied = HashSet::new();
    let mut fleet = Vec::with_capacity(lengths.len());
    for &length in lengths {
        if length == 0 || length > size {
            return None;
        }
        let mut placed = false;
        for _ in 0..100 {
            let horizontal: bool = rng.random();
            let (max_x, max_y) = if horizontal {
                (size - length, size - 1)
            } else {
                (size - 1, size - length)
            };
            let placement = ShipPlacement {
                x: rng.random_range(0..=max_x),
                y: rng.random_range(0..=max_y),
                length,
                horizontal,
            };
            if placement.cells().all(|cell| !occupied.contains(&cell)) {
                occupied.extend(placement.cells());
                fleet.push(placement);
                placed = true;
                break;
            }
        }
        if !placed {
            return None;
        }
    }
    Some(fleet)
}
