//! Player-service request/response envelopes, oneof-style bodies included.

use super::common::BizResult;
use super::views::{
    ArmyView, BuildingView, CellView, CityView, GeneralView, PosTagView, ResourceView, RoleView,
};
use serde::{Deserialize, Serialize};

/// Discriminant of a player request body; the dispatcher keys its handler
/// table on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlayerReqKind {
    EnterServer,
    CreateRole,
    WorldMap,
    MyProperty,
    MyGenerals,
    PosTagList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnterServerRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub nick_name: String,
    pub sex: i32,
    pub head_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMapRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyPropertyRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyGeneralsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosTagListRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerReqBody {
    EnterServer(EnterServerRequest),
    CreateRole(CreateRoleRequest),
    WorldMap(WorldMapRequest),
    MyProperty(MyPropertyRequest),
    MyGenerals(MyGeneralsRequest),
    PosTagList(PosTagListRequest),
}

impl PlayerReqBody {
    pub fn kind(&self) -> PlayerReqKind {
        match self {
            Self::EnterServer(_) => PlayerReqKind::EnterServer,
            Self::CreateRole(_) => PlayerReqKind::CreateRole,
            Self::WorldMap(_) => PlayerReqKind::WorldMap,
            Self::MyProperty(_) => PlayerReqKind::MyProperty,
            Self::MyGenerals(_) => PlayerReqKind::MyGenerals,
            Self::PosTagList(_) => PlayerReqKind::PosTagList,
        }
    }
}

/// Transport envelope for one player-service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub player_id: i64,
    pub world_id: i64,
    /// Client-supplied idempotency token; must be positive and unique within
    /// the actor's sliding window.
    pub seq: i64,
    pub body: Option<PlayerReqBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnterServerResponse {
    pub role: RoleView,
    pub resource: ResourceView,
    pub token: String,
    pub time_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRoleResponse {
    pub role: RoleView,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldMapResponse {
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyPropertyResponse {
    pub resource: ResourceView,
    pub buildings: Vec<BuildingView>,
    pub generals: Vec<GeneralView>,
    pub armies: Vec<ArmyView>,
    pub cities: Vec<CityView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MyGeneralsResponse {
    pub generals: Vec<GeneralView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosTagListResponse {
    pub pos_tags: Vec<PosTagView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerRespBody {
    EnterServer(EnterServerResponse),
    CreateRole(CreateRoleResponse),
    WorldMap(WorldMapResponse),
    MyProperty(MyPropertyResponse),
    MyGenerals(MyGeneralsResponse),
    PosTagList(PosTagListResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub result: BizResult,
    pub body: Option<PlayerRespBody>,
}

impl PlayerResponse {
    pub fn ok(body: PlayerRespBody) -> Self {
        Self {
            result: BizResult::ok(),
            body: Some(body),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            result: BizResult::ok(),
            body: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            result: BizResult::fail(reason),
            body: None,
        }
    }
}
