//! Game lifecycle: creating and starting games, and reading them back.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::common::{Outcome, Rejection, ServerError};
use crate::model::{BoardTile, Game, GameId, GamePhase, Identity, PlayerId, Ship};
use crate::player::resolve_caller;
use crate::store::Transaction;

/// A game row together with every tile and ship placed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub game: Game,
    pub tiles: Vec<BoardTile>,
    pub ships: Vec<Ship>,
}

impl GameView {
    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    /// Tiles on `owner`'s board.
    pub fn board_of(&self, owner: PlayerId) -> impl Iterator<Item = &BoardTile> {
        self.tiles.iter().filter(move |t| t.owner_id == owner)
    }

    /// Ships of `owner`'s fleet.
    pub fn fleet_of(&self, owner: PlayerId) -> impl Iterator<Item = &Ship> {
        self.ships.iter().filter(move |s| s.owner_id == owner)
    }
}

/// Create a game between the caller and `opponent_id`; the caller moves first.
///
/// The opponent id is taken on trust: it need not name a connected player,
/// nor differ from the caller.
pub fn create_game<T: Transaction>(
    tx: &mut T,
    caller: &Identity,
    opponent_id: PlayerId,
) -> Result<GameId, ServerError> {
    let player = resolve_caller(tx, caller)?;
    let game = tx.insert_game(Game::new(player.player_id, opponent_id))?;
    info!(
        "game {} created: player {} vs player {}",
        game.game_id, game.player1_id, game.player2_id
    );
    Ok(game.game_id)
}

/// Close the placement phase of a game.
pub fn start_game<T: Transaction>(
    tx: &mut T,
    caller: &Identity,
    game_id: GameId,
) -> Result<Outcome<()>, ServerError> {
    let player = resolve_caller(tx, caller)?;
    let Some(mut game) = tx.find_game(game_id) else {
        return Ok(Outcome::Rejected(Rejection::GameMissing));
    };
    let rejection = match game.phase() {
        GamePhase::Ended => Some(Rejection::GameEnded),
        GamePhase::InProgress => Some(Rejection::GameStarted),
        GamePhase::Unstarted if !game.is_participant(player.player_id) => {
            Some(Rejection::NotParticipant)
        }
        GamePhase::Unstarted => None,
    };
    if let Some(reason) = rejection {
        debug!("start of game {} by player {} ignored: {}", game_id, player.player_id, reason);
        return Ok(Outcome::Rejected(reason));
    }

    game.game_started = true;
    tx.update_game(game)?;
    info!("game {} started by player {}", game_id, player.player_id);
    Ok(Outcome::Applied(()))
}

pub fn game_view<T: Transaction>(
    tx: &T,
    caller: &Identity,
    game_id: GameId,
) -> Result<GameView, ServerError> {
    resolve_caller(tx, caller)?;
    let game = tx
        .find_game(game_id)
        .ok_or(ServerError::GameNotFound(game_id))?;
    Ok(GameView {
        game,
        tiles: tx.tiles_in_game(game_id),
        ships: tx.ships_in_game(game_id),
    })
}

/// Games the caller plays in, as either side.
pub fn list_games<T: Transaction>(tx: &T, caller: &Identity) -> Result<Vec<Game>, ServerError> {
    let player = resolve_caller(tx, caller)?;
    Ok(tx.games_for_player(player.player_id))
}
