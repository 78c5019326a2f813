//! Stateful-entity runtime for an online strategy-game backend.
//!
//! Three tightly coupled subsystems make up the core shared by the player and
//! world services:
//!
//! 1. A manager → entity-actor hierarchy: one single-writer actor per entity,
//!    spawned lazily by a keyed manager that forwards requests so replies
//!    reach the original asker.
//! 2. A dirty-change tracker plus write-behind persistence pipeline (the
//!    durability coordinator): mutations coalesce into versioned snapshots,
//!    a per-entity writer task makes them durable in order, and failed saves
//!    retry until superseded.
//! 3. A cross-actor request protocol over which player actors ask the world
//!    actor for city allocation, the tile grid, or a player's holdings, with
//!    reentrant continuations that keep handlers off the mailbox's critical
//!    path.
//!
//! The WebSocket gate, gRPC transport, and account service sit outside this
//! crate; the core only sees already-parsed typed requests.

pub mod actor;
pub mod config;
pub mod core;
pub mod dc;
pub mod entity;
pub mod proto;
pub mod repo;
pub mod runtime;

pub use crate::core::{CityId, GameError, PlayerId, Result, WorldId};
pub use actor::{ActorRef, ActorSystem, AskError, Lifecycle, Recipient};
pub use config::GameConfig;
pub use dc::Dc;
pub use entity::{EntitySnap, PersistEntity, PlayerEntity, PlayerSnap, WorldEntity, WorldSnap};
pub use repo::{
    DocumentPlayerRepository, DocumentWorldRepository, MemoryPlayerRepository,
    MemoryWorldRepository, Repository,
};
pub use runtime::{PlayerRuntime, RuntimeError, TransportCode, WorldRuntime, DEFAULT_ASK_TIMEOUT};
