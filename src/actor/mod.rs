//! Actor hierarchy: the mailbox runtime, one manager per service, and the
//! single-writer entity actors they spawn.

pub mod player;
mod runtime;
mod seq;
pub mod world;

pub use player::{PlayerActor, PlayerManagerActor};
pub use runtime::{
    Actor, ActorRef, ActorSystem, AskError, BoxFuture, Context, FlushTicker, Recipient, Replier,
};
pub use world::{WorldActor, WorldManagerActor};

use std::time::Duration;

/// Entity-actor lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    None,
    Init,
    Online,
    LoadFailed,
    Stopping,
    Offline,
}

/// Sliding seq-dedup window size per entity actor.
pub(crate) const SEQ_WINDOW_SIZE: usize = 1024;

/// Deadline for closing an entity actor's durability pipeline.
pub(crate) const DC_CLOSE_DEADLINE: Duration = Duration::from_secs(3);

/// Deadline for the synchronous flush of first-time defaults during init.
pub(crate) const INIT_FLUSH_DEADLINE: Duration = Duration::from_secs(3);

/// Deadline for the world-side bootstrap ask during player init.
pub(crate) const CREATE_CITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for non-bootstrap peer asks issued from handlers.
pub(crate) const PEER_ASK_TIMEOUT: Duration = Duration::from_millis(500);
