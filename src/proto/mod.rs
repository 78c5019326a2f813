//! Typed protocol surface of the core: transport envelopes the gate produces,
//! response envelopes it consumes, and the cross-actor ask pairs.

mod common;
mod player;
mod views;
mod world;

pub use common::{reason, BizResult};
pub use player::*;
pub use views::*;
pub use world::*;
