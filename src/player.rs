//! Identity hooks: mapping a caller to its player record.

use log::{debug, info};

use crate::common::ServerError;
use crate::model::{Identity, Player, PlayerId};
use crate::store::Transaction;

/// Resolve the caller to its active player record.
pub fn resolve_caller<T: Transaction>(tx: &T, caller: &Identity) -> Result<Player, ServerError> {
    tx.find_player(caller).ok_or(ServerError::PlayerNotFound)
}

/// Bring `identity` online, creating or reviving its player record.
pub fn on_connect<T: Transaction>(tx: &mut T, identity: &Identity) -> Result<PlayerId, ServerError> {
    if let Some(player) = tx.find_player(identity) {
        debug!("{} already connected as player {}", identity, player.player_id);
        return Ok(player.player_id);
    }

    let player = match tx.delete_archived_player(identity) {
        Some(archived) => {
            info!("player {} reconnected", archived.player_id);
            tx.insert_player(archived)?
        }
        None => {
            let player = tx.insert_player(Player::new(identity.clone()))?;
            info!("new player {} for {}", player.player_id, identity);
            player
        }
    };
    Ok(player.player_id)
}

/// Archive the caller's record. Games in progress are left as they are.
pub fn on_disconnect<T: Transaction>(tx: &mut T, identity: &Identity) -> Result<(), ServerError> {
    let player = tx
        .delete_player(identity)
        .ok_or(ServerError::PlayerNotFound)?;
    info!("player {} disconnected", player.player_id);
    tx.insert_archived_player(player)?;
    Ok(())
}

pub fn set_name<T: Transaction>(
    tx: &mut T,
    caller: &Identity,
    name: String,
) -> Result<(), ServerError> {
    let player = resolve_caller(tx, caller)?;
    debug!("player {} is now named {:?}", player.player_id, name);
    tx.update_player(Player { name, ..player })?;
    Ok(())
}
