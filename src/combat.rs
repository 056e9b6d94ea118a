//! Shot resolution: tile lookup, hit marking, damage and sinking.

use log::{debug, info};

use crate::common::{Outcome, Rejection, ServerError, Shot, ShotResult, Turn};
use crate::config::{DamageModel, Rules};
use crate::model::{BoardTile, GameId, Identity, PlayerId, ShipId};
use crate::player::resolve_caller;
use crate::store::Transaction;
use crate::turn::resolve_turn;

/// Fire at (`x`, `y`) on the opponent's board and advance the game.
///
/// Shots out of turn or after the game has ended are rejected without any
/// write. A shot at water or at an already-hit tile still spends the turn.
pub fn fire_at<T: Transaction>(
    tx: &mut T,
    rules: &Rules,
    caller: &Identity,
    game_id: GameId,
    x: u32,
    y: u32,
) -> Result<Outcome<Shot>, ServerError> {
    let shooter = resolve_caller(tx, caller)?.player_id;
    let mut game = tx
        .find_game(game_id)
        .ok_or(ServerError::GameNotFound(game_id))?;

    let rejection = if game.game_ended {
        Some(Rejection::GameEnded)
    } else if game.current_turn_id != shooter {
        Some(Rejection::NotYourTurn)
    } else {
        None
    };
    if let Some(reason) = rejection {
        debug!("shot by player {} in game {} ignored: {}", shooter, game_id, reason);
        return Ok(Outcome::Rejected(reason));
    }

    let opponent = game.opponent_of(shooter);
    let result = strike(tx, rules, game_id, opponent, x, y)?;

    let ships = tx.ships_in_game(game_id);
    let turn = resolve_turn(&mut game, &ships, shooter, opponent);
    tx.update_game(game)?;

    if let Turn::Won(winner) = turn {
        info!("game {} won by player {}", game_id, winner);
    }
    debug!(
        "player {} fired at ({}, {}) in game {}: {:?}, {:?}",
        shooter, x, y, game_id, result, turn
    );
    Ok(Outcome::Applied(Shot { result, turn }))
}

/// Mark every unhit tile of `opponent`'s board at (`x`, `y`) and credit any damage.
fn strike<T: Transaction>(
    tx: &mut T,
    rules: &Rules,
    game_id: GameId,
    opponent: PlayerId,
    x: u32,
    y: u32,
) -> Result<ShotResult, ServerError> {
    let targets: Vec<BoardTile> = tx
        .tiles_in_game(game_id)
        .into_iter()
        .filter(|t| t.owner_id == opponent && t.x == x && t.y == y)
        .collect();
    if targets.is_empty() {
        return Ok(ShotResult::Miss);
    }
    let fresh: Vec<BoardTile> = targets.into_iter().filter(|t| !t.hit).collect();
    if fresh.is_empty() {
        return Ok(ShotResult::AlreadyHit);
    }

    // Ships may be stacked on one cell; each of them takes the hit.
    let mut struck = Vec::new();
    for mut tile in fresh {
        tile.hit = true;
        if tile.has_ship {
            struck.push(tile.ship_id);
        }
        tx.update_tile(tile)?;
    }
    if struck.is_empty() {
        return Ok(ShotResult::Miss);
    }

    let sunk = credit_damage(tx, rules, game_id, opponent, &struck)?;
    Ok(if sunk.is_empty() {
        ShotResult::Hit
    } else {
        ShotResult::Sink(sunk)
    })
}

/// Credit one hit to the ships of `owner`'s fleet selected by the damage model.
/// Returns ships sunk by it.
///
/// Zero-length ships cover no tile; under [`DamageModel::StruckShip`] they go
/// down with the first hit their fleet takes.
fn credit_damage<T: Transaction>(
    tx: &mut T,
    rules: &Rules,
    game_id: GameId,
    owner: PlayerId,
    struck: &[Option<ShipId>],
) -> Result<Vec<ShipId>, ServerError> {
    let credited = tx.ships_in_game(game_id).into_iter().filter(|s| {
        s.owner_id == owner
            && match rules.damage {
                DamageModel::StruckShip => {
                    struck.contains(&Some(s.ship_id)) || (s.length == 0 && !s.sunk)
                }
                DamageModel::Fleetwide => true,
            }
    });

    let mut sunk = Vec::new();
    for mut ship in credited {
        if ship.take_hit() {
            info!(
                "ship {} of player {} sunk in game {}",
                ship.ship_id, ship.owner_id, ship.game_id
            );
            sunk.push(ship.ship_id);
        }
        tx.update_ship(ship)?;
    }
    Ok(sunk)
}
