use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Version spoken in the session handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest frame accepted on a transport (1 MiB).
pub const MAX_FRAME_SIZE: u32 = 1 << 20;

/// Default timeout for a single send or receive.
pub const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Receive timeout of a server session waiting for the next request.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default listen address of the server binary.
pub const DEFAULT_BIND: &str = "0.0.0.0:7878";

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "BATTLESHIP_LOG";

/// Board edge used by the simulator; the server itself does not enforce one.
pub const BOARD_SIZE: u32 = 10;

/// Standard fleet (name, length) laid out by the simulator.
pub const SHIPS: [(&str, u32); 5] = [
    ("Carrier", 5),
    ("Battleship", 4),
    ("Cruiser", 3),
    ("Submarine", 3),
    ("Destroyer", 2),
];

/// Which ships are credited when a shot strikes a ship segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum DamageModel {
    /// Only the ship laid over the struck tile.
    #[default]
    StruckShip,
    /// Every ship of the struck fleet.
    Fleetwide,
}

/// Rule switches applied by the game server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub damage: DamageModel,
}

impl Rules {
    pub fn with_damage(damage: DamageModel) -> Self {
        Self { damage }
    }
}
