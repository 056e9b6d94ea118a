//! Game server facade: every public operation is one atomic transaction.

use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;

use crate::combat;
use crate::common::{Outcome, ServerError, Shot, StoreError};
use crate::config::Rules;
use crate::fleet::{self, ShipPlacement};
use crate::game::{self, GameView};
use crate::model::{Game, GameId, Identity, PlayerId, ShipId};
use crate::player;
use crate::store::{atomically, MemoryStore, Store};

/// Authoritative game server over a storage backend.
pub struct GameServer<S: Store> {
    store: S,
    rules: Rules,
    // Open sessions per identity; a player is archived when its last one closes.
    sessions: Mutex<HashMap<Identity, usize>>,
}

impl GameServer<MemoryStore> {
    /// Server over a fresh in-memory store with default rules.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), Rules::default())
    }
}

impl<S: Store> GameServer<S> {
    pub fn new(store: S, rules: Rules) -> Self {
        Self {
            store,
            rules,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// Session hook: yield the player id of a connecting identity.
    pub fn connect(&self, identity: &Identity) -> Result<PlayerId, ServerError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        let player_id = atomically(&self.store, |tx| player::on_connect(tx, identity))?;
        *sessions.entry(identity.clone()).or_insert(0) += 1;
        Ok(player_id)
    }

    /// Session hook: archive the player record of a leaving identity once
    /// none of its sessions remain open.
    pub fn disconnect(&self, identity: &Identity) -> Result<(), ServerError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        match sessions.get_mut(identity) {
            Some(open) if *open > 1 => {
                *open -= 1;
                debug!("{} still has {} open session(s)", identity, open);
                return Ok(());
            }
            Some(_) => {
                sessions.remove(identity);
            }
            None => {}
        }
        atomically(&self.store, |tx| player::on_disconnect(tx, identity))
    }

    pub fn set_name(&self, caller: &Identity, name: impl Into<String>) -> Result<(), ServerError> {
        let name = name.into();
        atomically(&self.store, |tx| player::set_name(tx, caller, name))
    }

    pub fn create_game(&self, caller: &Identity, opponent_id: PlayerId) -> Result<GameId, ServerError> {
        atomically(&self.store, |tx| game::create_game(tx, caller, opponent_id))
    }

    pub fn start_game(&self, caller: &Identity, game_id: GameId) -> Result<Outcome<()>, ServerError> {
        atomically(&self.store, |tx| game::start_game(tx, caller, game_id))
    }

    pub fn place_ship(
        &self,
        caller: &Identity,
        game_id: GameId,
        x: u32,
        y: u32,
        length: u32,
        horizontal: bool,
    ) -> Result<Outcome<ShipId>, ServerError> {
        let placement = ShipPlacement {
            x,
            y,
            length,
            horizontal,
        };
        atomically(&self.store, |tx| fleet::place_ship(tx, caller, game_id, placement))
    }

    pub fn fire_at(
        &self,
        caller: &Identity,
        game_id: GameId,
        x: u32,
        y: u32,
    ) -> Result<Outcome<Shot>, ServerError> {
        let rules = self.rules;
        atomically(&self.store, |tx| combat::fire_at(tx, &rules, caller, game_id, x, y))
    }

    pub fn game_view(&self, caller: &Identity, game_id: GameId) -> Result<GameView, ServerError> {
        atomically(&self.store, |tx| game::game_view(tx, caller, game_id))
    }

    pub fn list_games(&self, caller: &Identity) -> Result<Vec<Game>, ServerError> {
        atomically(&self.store, |tx| game::list_games(tx, caller))
    }
}
