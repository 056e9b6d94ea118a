//! Server-authoritative core of a two-player Battleship game.
//!
//! Clients place fleets and fire shots through a [`GameServer`]; every
//! operation runs as one atomic transaction against a [`Store`].

mod combat;
mod common;
mod config;
mod fleet;
mod game;
mod logging;
mod model;
mod player;
mod server;
mod turn;

pub mod client;
pub mod protocol;
pub mod session;
pub mod store;
pub mod transport;

pub use client::Client;
pub use common::*;
pub use config::*;
pub use fleet::{random_fleet, ShipPlacement};
pub use game::GameView;
pub use logging::init_logging;
pub use model::*;
pub use protocol::{Failure, Message, Request, Response};
pub use server::GameServer;
pub use session::{dispatch, serve, Session};
pub use store::{atomically, MemoryStore, Store, Transaction};
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport, Transport};
pub use turn::{fleet_sunk, resolve_turn};

/// Operation bodies, usable inside a caller-managed [`Transaction`].
pub mod ops {
    pub use crate::combat::fire_at;
    pub use crate::fleet::place_ship;
    pub use crate::game::{create_game, game_view, list_games, start_game};
    pub use crate::player::{on_connect, on_disconnect, resolve_caller, set_name};
}
pub mod prelude;
