//! Plain value states for every aggregate and collection element.
//!
//! These are the serde-facing shapes: repositories persist them whole,
//! snapshots deep-copy into them, and the trackable aggregates hydrate from
//! them.

use crate::core::CityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role profile of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleState {
    pub head_id: i64,
    pub sex: i8,
    pub nick_name: String,
    pub balance: i64,
    pub profile: String,
    pub login_time: Option<DateTime<Utc>>,
    pub logout_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Resource wallet of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
    pub grain: i64,
    pub gold: i64,
    pub decree: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosTag {
    pub x: i64,
    pub y: i64,
    pub name: String,
}

/// Union / map-marker attributes of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAttributeState {
    pub union_id: i64,
    pub parent_id: i64,
    pub collect_times: i8,
    pub last_collect_time: Option<DateTime<Utc>>,
    pub pos_tags: Vec<PosTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingState {
    pub id: i64,
    pub building_type: i8,
    pub level: i8,
    pub op_level: i8,
    pub x: i64,
    pub y: i64,
    pub name: String,
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
    pub grain: i64,
    pub defender: i64,
    pub cur_durable: i64,
    pub max_durable: i64,
    pub occupy_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub give_up_time: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    pub id: i64,
    pub lv: i64,
    pub cfg_id: i64,
}

/// General state machine: 0 normal, 1 converted away.
pub const GENERAL_NORMAL: i8 = 0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralState {
    pub id: i64,
    pub cfg_id: i64,
    pub power: i64,
    pub order_index: i8,
    pub level: i8,
    pub exp: i64,
    pub city_id: i64,
    pub cur_arms: i64,
    pub has_pr_point: i64,
    pub use_pr_point: i64,
    pub attack_distance: i64,
    pub force_added: i64,
    pub strategy_added: i64,
    pub defense_added: i64,
    pub speed_added: i64,
    pub destroy_added: i64,
    pub star: i8,
    pub star_lv: i8,
    pub parent_id: i64,
    pub skills: Vec<SkillState>,
    pub state: i8,
    pub created_at: Option<DateTime<Utc>>,
}

/// Army march/garrison commands.
pub mod army_cmd {
    pub const IDLE: i8 = 0;
    pub const ATTACK: i8 = 1;
    pub const DEFEND: i8 = 2;
    pub const RECLAMATION: i8 = 3;
    pub const BACK: i8 = 4;
    pub const CONSCRIPT: i8 = 5;
    pub const TRANSFER: i8 = 6;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmyState {
    pub id: i64,
    pub city_id: i64,
    pub order_index: i8,
    pub generals: Vec<i64>,
    pub soldiers: Vec<i64>,
    pub conscript_times: Vec<i64>,
    pub conscript_counts: Vec<i64>,
    pub cmd: i8,
    pub state: i8,
    pub from_x: i64,
    pub from_y: i64,
    pub to_x: i64,
    pub to_y: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Battle outcome: 0 defeat, 1 draw, 2 victory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarReportState {
    pub id: i64,
    pub attacker: i64,
    pub defender: i64,
    pub result: i8,
    pub rounds: String,
    pub attack_is_read: bool,
    pub defense_is_read: bool,
    pub destroy_durable: i64,
    pub occupy: i64,
    pub x: i64,
    pub y: i64,
    pub ctime: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityState {
    pub name: String,
    pub private_level: i8,
    pub ftype: i8,
    /// Upgrade-finish timestamp in unix ms; zero means the level is complete.
    pub up_time: i64,
}

/// One tile of the shared world map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub cell_type: i8,
    pub name: String,
    pub level: i8,
    pub defender: i64,
    pub durable: i64,
    pub grain: i64,
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityState {
    pub city_id: CityId,
    pub name: String,
    pub union_id: i64,
    pub union_name: String,
    pub parent_id: i64,
    pub x: i64,
    pub y: i64,
    pub is_main: bool,
    pub level: i8,
    pub cur_durable: i64,
    pub max_durable: i64,
    pub occupy_time: Option<DateTime<Utc>>,
}
