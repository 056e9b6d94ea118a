//! Commonly used types and utilities for ease of import.

pub use crate::{
    Client, DamageModel, GameServer, Identity, InMemoryTransport, MemoryStore, Outcome, Rejection,
    Rules, ShotResult, TcpTransport, Transport, Turn,
};
