//! Turn and win resolution after a shot.
//!
//! The only transitions are "turn passes to the opponent" and "game ends with
//! the shooter as winner". `current_turn_id` therefore only ever takes the
//! value of one of the two participants, and an ended game is never touched
//! again because the combat guard rejects every later shot.

use crate::common::Turn;
use crate::model::{Game, PlayerId, Ship};

/// `true` when every ship `owner` has in `ships` is sunk.
///
/// An empty fleet counts as sunk, and so does a ship of length zero.
pub fn fleet_sunk(ships: &[Ship], owner: PlayerId) -> bool {
    ships
        .iter()
        .filter(|s| s.owner_id == owner)
        .all(|s| s.sunk || s.length == 0)
}

/// Decide the game's next state after `shooter` fired at `opponent`.
///
/// `ships` must hold the game's ships as they are after damage was credited.
pub fn resolve_turn(game: &mut Game, ships: &[Ship], shooter: PlayerId, opponent: PlayerId) -> Turn {
    debug_assert!(!game.game_ended);
    if fleet_sunk(ships, opponent) {
        game.game_ended = true;
        game.winner_id = Some(shooter);
        Turn::Won(shooter)
    } else {
        game.current_turn_id = opponent;
        Turn::Next(opponent)
    }
}
