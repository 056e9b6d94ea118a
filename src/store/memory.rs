//! In-memory store with an optional on-disk snapshot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::common::StoreError;
use crate::model::{BoardTile, Game, GameId, Identity, Player, PlayerId, Ship, ShipId, TileId};
use crate::store::{Store, Transaction};

/// Last id handed out per relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    player: PlayerId,
    game: GameId,
    tile: TileId,
    ship: ShipId,
}

fn next_id(counter: &mut u32, table: &'static str) -> Result<u32, StoreError> {
    *counter = counter
        .checked_add(1)
        .ok_or(StoreError::IdsExhausted { table })?;
    Ok(*counter)
}

/// Keep the sequence ahead of an explicitly chosen id.
fn observe_id(counter: &mut u32, id: u32) {
    *counter = (*counter).max(id);
}

/// Full content of every relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    players: BTreeMap<Identity, Player>,
    archived_players: BTreeMap<Identity, Player>,
    games: BTreeMap<GameId, Game>,
    // Keyed by (game_id, row id) so a game's rows are one contiguous range.
    tiles: BTreeMap<(GameId, TileId), BoardTile>,
    ships: BTreeMap<(GameId, ShipId), Ship>,
    sequences: Sequences,
}

impl Tables {
    fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = bincode::serialize(self)?;
        let staging = staging_path(path);
        fs::write(&staging, bytes)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

/// Sibling of `path` the snapshot is staged in before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

/// Relations held in process memory behind a single lock.
///
/// Transactions are serialized: `begin` holds the lock until the transaction
/// is committed or dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted to `path`, loading it if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = if path.exists() {
            let tables = Tables::load(&path)?;
            info!(
                "loaded snapshot {} ({} games, {} players)",
                path.display(),
                tables.games.len(),
                tables.players.len() + tables.archived_players.len()
            );
            tables
        } else {
            Tables::default()
        };
        Ok(Self {
            tables: Mutex::new(tables),
            snapshot: Some(path),
        })
    }

    /// Path of the snapshot file, if this store persists one.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }
}

impl Store for MemoryStore {
    type Tx<'a>
        = MemoryTransaction<'a>
    where
        Self: 'a;

    fn begin(&self) -> Result<MemoryTransaction<'_>, StoreError> {
        let guard = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(MemoryTransaction {
            guard,
            working: None,
            snapshot: self.snapshot.as_deref(),
        })
    }
}

/// Lock on the published tables plus a private working copy, taken on the
/// first write. A transaction that never writes commits without touching
/// the tables or the snapshot.
pub struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, Tables>,
    working: Option<Tables>,
    snapshot: Option<&'a Path>,
}

impl MemoryTransaction<'_> {
    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let published: &Tables = &self.guard;
        self.working.get_or_insert_with(|| Tables::clone(published))
    }
}

fn duplicate(table: &'static str, key: impl ToString) -> StoreError {
    StoreError::Duplicate {
        table,
        key: key.to_string(),
    }
}

fn missing(table: &'static str, key: impl ToString) -> StoreError {
    StoreError::RowNotFound {
        table,
        key: key.to_string(),
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn find_player(&self, identity: &Identity) -> Option<Player> {
        self.tables().players.get(identity).cloned()
    }

    fn find_player_by_id(&self, player_id: PlayerId) -> Option<Player> {
        self.tables()
            .players
            .values()
            .find(|p| p.player_id == player_id)
            .cloned()
    }

    fn insert_player(&mut self, mut player: Player) -> Result<Player, StoreError> {
        if self.tables().players.contains_key(&player.identity) {
            return Err(duplicate("player", &player.identity));
        }
        if player.player_id != 0 && self.find_player_by_id(player.player_id).is_some() {
            return Err(duplicate("player", player.player_id));
        }
        let tables = self.tables_mut();
        if player.player_id == 0 {
            player.player_id = next_id(&mut tables.sequences.player, "player")?;
        } else {
            observe_id(&mut tables.sequences.player, player.player_id);
        }
        tables.players.insert(player.identity.clone(), player.clone());
        Ok(player)
    }

    fn update_player(&mut self, player: Player) -> Result<(), StoreError> {
        if !self.tables().players.contains_key(&player.identity) {
            return Err(missing("player", &player.identity));
        }
        self.tables_mut()
            .players
            .insert(player.identity.clone(), player);
        Ok(())
    }

    fn delete_player(&mut self, identity: &Identity) -> Option<Player> {
        if !self.tables().players.contains_key(identity) {
            return None;
        }
        self.tables_mut().players.remove(identity)
    }

    fn find_archived_player(&self, identity: &Identity) -> Option<Player> {
        self.tables().archived_players.get(identity).cloned()
    }

    fn insert_archived_player(&mut self, player: Player) -> Result<(), StoreError> {
        if self.tables().archived_players.contains_key(&player.identity) {
            return Err(duplicate("logged_out_player", &player.identity));
        }
        self.tables_mut()
            .archived_players
            .insert(player.identity.clone(), player);
        Ok(())
    }

    fn delete_archived_player(&mut self, identity: &Identity) -> Option<Player> {
        if !self.tables().archived_players.contains_key(identity) {
            return None;
        }
        self.tables_mut().archived_players.remove(identity)
    }

    fn insert_game(&mut self, mut game: Game) -> Result<Game, StoreError> {
        if game.game_id != 0 && self.tables().games.contains_key(&game.game_id) {
            return Err(duplicate("game", game.game_id));
        }
        let tables = self.tables_mut();
        if game.game_id == 0 {
            game.game_id = next_id(&mut tables.sequences.game, "game")?;
        } else {
            observe_id(&mut tables.sequences.game, game.game_id);
        }
        tables.games.insert(game.game_id, game.clone());
        Ok(game)
    }

    fn find_game(&self, game_id: GameId) -> Option<Game> {
        self.tables().games.get(&game_id).cloned()
    }

    fn update_game(&mut self, game: Game) -> Result<(), StoreError> {
        if !self.tables().games.contains_key(&game.game_id) {
            return Err(missing("game", game.game_id));
        }
        self.tables_mut().games.insert(game.game_id, game);
        Ok(())
    }

    fn games_for_player(&self, player_id: PlayerId) -> Vec<Game> {
        self.tables()
            .games
            .values()
            .filter(|g| g.is_participant(player_id))
            .cloned()
            .collect()
    }

    fn insert_tile(&mut self, mut tile: BoardTile) -> Result<BoardTile, StoreError> {
        if tile.tile_id != 0 && self.tables().tiles.keys().any(|&(_, id)| id == tile.tile_id) {
            return Err(duplicate("board_tile", tile.tile_id));
        }
        let tables = self.tables_mut();
        if tile.tile_id == 0 {
            tile.tile_id = next_id(&mut tables.sequences.tile, "board_tile")?;
        } else {
            observe_id(&mut tables.sequences.tile, tile.tile_id);
        }
        tables.tiles.insert((tile.game_id, tile.tile_id), tile.clone());
        Ok(tile)
    }

    fn tiles_in_game(&self, game_id: GameId) -> Vec<BoardTile> {
        self.tables()
            .tiles
            .range((game_id, TileId::MIN)..=(game_id, TileId::MAX))
            .map(|(_, tile)| tile.clone())
            .collect()
    }

    fn update_tile(&mut self, tile: BoardTile) -> Result<(), StoreError> {
        let key = (tile.game_id, tile.tile_id);
        if !self.tables().tiles.contains_key(&key) {
            return Err(missing("board_tile", tile.tile_id));
        }
        self.tables_mut().tiles.insert(key, tile);
        Ok(())
    }

    fn insert_ship(&mut self, mut ship: Ship) -> Result<Ship, StoreError> {
        if ship.ship_id != 0 && self.tables().ships.keys().any(|&(_, id)| id == ship.ship_id) {
            return Err(duplicate("ship", ship.ship_id));
        }
        let tables = self.tables_mut();
        if ship.ship_id == 0 {
            ship.ship_id = next_id(&mut tables.sequences.ship, "ship")?;
        } else {
            observe_id(&mut tables.sequences.ship, ship.ship_id);
        }
        tables.ships.insert((ship.game_id, ship.ship_id), ship.clone());
        Ok(ship)
    }

    fn ships_in_game(&self, game_id: GameId) -> Vec<Ship> {
        self.tables()
            .ships
            .range((game_id, ShipId::MIN)..=(game_id, ShipId::MAX))
            .map(|(_, ship)| ship.clone())
            .collect()
    }

    fn update_ship(&mut self, ship: Ship) -> Result<(), StoreError> {
        let key = (ship.game_id, ship.ship_id);
        if !self.tables().ships.contains_key(&key) {
            return Err(missing("ship", ship.ship_id));
        }
        self.tables_mut().ships.insert(key, ship);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let Some(working) = self.working.take() else {
            return Ok(());
        };
        if let Some(path) = self.snapshot {
            working.save(path)?;
            debug!("snapshot written to {}", path.display());
        }
        *self.guard = working;
        Ok(())
    }
}
