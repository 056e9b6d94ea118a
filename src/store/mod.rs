//! Storage interface for the persisted relations.
//!
//! Every public operation runs inside one [`Transaction`] obtained from a
//! [`Store`]. A transaction sees a consistent view of all relations, and its
//! writes become visible to other operations only when it is committed.
//! Dropping a transaction without committing discards its writes.

pub mod memory;

use crate::common::{ServerError, StoreError};
use crate::model::{BoardTile, Game, GameId, Identity, Player, PlayerId, Ship};

pub use memory::MemoryStore;

/// Read/write access to the relations within one unit of work.
pub trait Transaction {
    /// Active player by identity.
    fn find_player(&self, identity: &Identity) -> Option<Player>;
    /// Active player by player id.
    fn find_player_by_id(&self, player_id: PlayerId) -> Option<Player>;
    /// Insert an active player, assigning an id when `player_id` is `0`.
    fn insert_player(&mut self, player: Player) -> Result<Player, StoreError>;
    fn update_player(&mut self, player: Player) -> Result<(), StoreError>;
    fn delete_player(&mut self, identity: &Identity) -> Option<Player>;

    fn find_archived_player(&self, identity: &Identity) -> Option<Player>;
    fn insert_archived_player(&mut self, player: Player) -> Result<(), StoreError>;
    fn delete_archived_player(&mut self, identity: &Identity) -> Option<Player>;

    fn insert_game(&mut self, game: Game) -> Result<Game, StoreError>;
    fn find_game(&self, game_id: GameId) -> Option<Game>;
    fn update_game(&mut self, game: Game) -> Result<(), StoreError>;
    /// Games in which `player_id` is either participant, by ascending id.
    fn games_for_player(&self, player_id: PlayerId) -> Vec<Game>;

    fn insert_tile(&mut self, tile: BoardTile) -> Result<BoardTile, StoreError>;
    /// Tiles of one game, by ascending tile id.
    fn tiles_in_game(&self, game_id: GameId) -> Vec<BoardTile>;
    fn update_tile(&mut self, tile: BoardTile) -> Result<(), StoreError>;

    fn insert_ship(&mut self, ship: Ship) -> Result<Ship, StoreError>;
    /// Ships of one game, by ascending ship id.
    fn ships_in_game(&self, game_id: GameId) -> Vec<Ship>;
    fn update_ship(&mut self, ship: Ship) -> Result<(), StoreError>;

    /// Publish every write made through this transaction.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A backend able to hand out serializable transactions.
pub trait Store: Send + Sync {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    /// Open a transaction with an exclusive, consistent view of the relations.
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;
}

/// Run `op` as a single atomic unit of work.
///
/// The transaction commits when `op` returns `Ok` and is rolled back when it
/// returns `Err`.
pub fn atomically<'s, S, T, F>(store: &'s S, op: F) -> Result<T, ServerError>
where
    S: Store,
    F: FnOnce(&mut S::Tx<'s>) -> Result<T, ServerError>,
{
    let mut tx = store.begin()?;
    let value = op(&mut tx)?;
    tx.commit()?;
    Ok(value)
}
