//! World-service envelopes and the cross-actor ask pairs.
//!
//! Player actors speak `WorldMessage`/`WorldReply` directly to the world side;
//! the world runtime facade translates the transport envelope into the same
//! message pairs so both paths hit one dispatcher.

use super::common::BizResult;
use super::views::{CellView, CityView};
use crate::entity::{CellState, CityState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorldMsgKind {
    CreateCity,
    WorldMap,
    MyCities,
}

/// Host → world: allocate the player's starting city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HwCreateCity {
    pub world_id: i64,
    pub player_id: i64,
    pub nick_name: String,
}

/// Host → world: fetch the tile grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HwWorldMap {
    pub world_id: i64,
    pub player_id: i64,
}

/// Host → world: enumerate the player's cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HwMyCities {
    pub world_id: i64,
    pub player_id: i64,
}

/// Typed ask from a player actor (or the world facade) to a world actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldMessage {
    CreateCity(HwCreateCity),
    WorldMap(HwWorldMap),
    MyCities(HwMyCities),
}

impl WorldMessage {
    pub fn kind(&self) -> WorldMsgKind {
        match self {
            Self::CreateCity(_) => WorldMsgKind::CreateCity,
            Self::WorldMap(_) => WorldMsgKind::WorldMap,
            Self::MyCities(_) => WorldMsgKind::MyCities,
        }
    }

    /// Keying capability the world manager routes on.
    pub fn world_id(&self) -> i64 {
        match self {
            Self::CreateCity(m) => m.world_id,
            Self::WorldMap(m) => m.world_id,
            Self::MyCities(m) => m.world_id,
        }
    }

    pub fn player_id(&self) -> i64 {
        match self {
            Self::CreateCity(m) => m.player_id,
            Self::WorldMap(m) => m.player_id,
            Self::MyCities(m) => m.player_id,
        }
    }
}

/// World → host: the allocated (or pre-existing) city. A non-positive
/// `city_id` means the world rejected the allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhCreateCity {
    pub city_id: i64,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhWorldMap {
    pub cells: Vec<CellState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhMyCities {
    pub cities: Vec<CityState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldReply {
    CreateCity(WhCreateCity),
    WorldMap(WhWorldMap),
    MyCities(WhMyCities),
    /// Business rejection (world not online, invalid id, ...).
    Fail { reason: String },
}

impl WorldReply {
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }
}

/// Transport envelope for one world-service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRequest {
    pub world_id: i64,
    pub body: Option<WorldMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldRespBody {
    CreateCity(WhCreateCity),
    WorldMap(Vec<CellView>),
    MyCities(Vec<CityView>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldResponse {
    pub result: BizResult,
    pub body: Option<WorldRespBody>,
}

impl WorldResponse {
    pub fn ok(body: WorldRespBody) -> Self {
        Self {
            result: BizResult::ok(),
            body: Some(body),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            result: BizResult::fail(reason),
            body: None,
        }
    }
}
