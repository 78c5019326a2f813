//! Response-facing DTOs converted from entity states.

use crate::entity::{
    ArmyState, BuildingState, CellState, CityState, GeneralState, PosTag, ResourceEntity,
    ResourceState, RoleEntity, SkillState,
};
use serde::{Deserialize, Serialize};

fn unix_ms(time: Option<chrono::DateTime<chrono::Utc>>) -> i64 {
    time.map(|t| t.timestamp_millis()).unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleView {
    pub nick_name: String,
    pub sex: i32,
    pub balance: i64,
    pub head_id: i64,
    pub profile: String,
}

impl From<&RoleEntity> for RoleView {
    fn from(role: &RoleEntity) -> Self {
        Self {
            nick_name: role.nick_name().to_string(),
            sex: role.sex() as i32,
            balance: role.balance(),
            head_id: role.head_id(),
            profile: role.profile_text().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
    pub grain: i64,
    pub gold: i64,
    pub decree: i64,
}

impl From<&ResourceEntity> for ResourceView {
    fn from(res: &ResourceEntity) -> Self {
        Self::from(&res.state())
    }
}

impl From<&ResourceState> for ResourceView {
    fn from(res: &ResourceState) -> Self {
        Self {
            wood: res.wood,
            iron: res.iron,
            stone: res.stone,
            grain: res.grain,
            gold: res.gold,
            decree: res.decree,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingView {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub building_type: i32,
    pub level: i32,
    pub op_level: i32,
    pub cur_durable: i64,
    pub max_durable: i64,
    pub defender: i64,
    pub occupy_time: i64,
    pub end_time: i64,
    pub give_up_time: i64,
}

impl From<&BuildingState> for BuildingView {
    fn from(b: &BuildingState) -> Self {
        Self {
            name: b.name.clone(),
            x: b.x,
            y: b.y,
            building_type: b.building_type as i32,
            level: b.level as i32,
            op_level: b.op_level as i32,
            cur_durable: b.cur_durable,
            max_durable: b.max_durable,
            defender: b.defender,
            occupy_time: unix_ms(b.occupy_time),
            end_time: unix_ms(b.end_time),
            give_up_time: b.give_up_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillView {
    pub id: i64,
    pub lv: i64,
    pub cfg_id: i64,
}

impl From<&SkillState> for SkillView {
    fn from(s: &SkillState) -> Self {
        Self {
            id: s.id,
            lv: s.lv,
            cfg_id: s.cfg_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralView {
    pub id: i64,
    pub cfg_id: i64,
    pub physical_power: i64,
    pub order_index: i32,
    pub level: i32,
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
    pub star: i32,
    pub star_lv: i32,
    pub parent_id: i64,
    pub skills: Vec<SkillView>,
    pub state: i32,
}

impl From<&GeneralState> for GeneralView {
    fn from(g: &GeneralState) -> Self {
        Self {
            id: g.id,
            cfg_id: g.cfg_id,
            physical_power: g.power,
            order_index: g.order_index as i32,
            level: g.level as i32,
            exp: g.exp,
            city_id: g.city_id,
            cur_arms: g.cur_arms,
            has_pr_point: g.has_pr_point,
            use_pr_point: g.use_pr_point,
            attack_distance: g.attack_distance,
            force_added: g.force_added,
            strategy_added: g.strategy_added,
            defense_added: g.defense_added,
            speed_added: g.speed_added,
            destroy_added: g.destroy_added,
            star: g.star as i32,
            star_lv: g.star_lv as i32,
            parent_id: g.parent_id,
            skills: g.skills.iter().map(SkillView::from).collect(),
            state: g.state as i32,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmyView {
    pub id: i64,
    pub city_id: i64,
    pub order_index: i32,
    pub generals: Vec<i64>,
    pub soldiers: Vec<i64>,
    pub conscript_times: Vec<i64>,
    pub conscript_counts: Vec<i64>,
    pub cmd: i32,
    pub state: i32,
    pub from_x: i64,
    pub from_y: i64,
    pub to_x: i64,
    pub to_y: i64,
    pub start: i64,
    pub end: i64,
}

impl From<&ArmyState> for ArmyView {
    fn from(a: &ArmyState) -> Self {
        Self {
            id: a.id,
            city_id: a.city_id,
            order_index: a.order_index as i32,
            generals: a.generals.clone(),
            soldiers: a.soldiers.clone(),
            conscript_times: a.conscript_times.clone(),
            conscript_counts: a.conscript_counts.clone(),
            cmd: a.cmd as i32,
            state: a.state as i32,
            from_x: a.from_x,
            from_y: a.from_y,
            to_x: a.to_x,
            to_y: a.to_y,
            start: unix_ms(a.start_time),
            end: unix_ms(a.end_time),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub cell_type: i32,
    pub name: String,
    pub level: i32,
    pub defender: i64,
    pub durable: i64,
    pub grain: i64,
    pub iron: i64,
    pub stone: i64,
    pub wood: i64,
}

impl From<&CellState> for CellView {
    fn from(c: &CellState) -> Self {
        Self {
            cell_type: c.cell_type as i32,
            name: c.name.clone(),
            level: c.level as i32,
            defender: c.defender,
            durable: c.durable,
            grain: c.grain,
            iron: c.iron,
            stone: c.stone,
            wood: c.wood,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityView {
    pub city_id: i64,
    pub name: String,
    pub union_id: i64,
    pub union_name: String,
    pub parent_id: i64,
    pub x: i64,
    pub y: i64,
    pub is_main: bool,
    pub level: i32,
    pub cur_durable: i64,
    pub max_durable: i64,
    pub occupy_time: i64,
}

impl From<&CityState> for CityView {
    fn from(c: &CityState) -> Self {
        Self {
            city_id: c.city_id.value(),
            name: c.name.clone(),
            union_id: c.union_id,
            union_name: c.union_name.clone(),
            parent_id: c.parent_id,
            x: c.x,
            y: c.y,
            is_main: c.is_main,
            level: c.level as i32,
            cur_durable: c.cur_durable,
            max_durable: c.max_durable,
            occupy_time: unix_ms(c.occupy_time),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosTagView {
    pub x: i64,
    pub y: i64,
    pub name: String,
}

impl From<&PosTag> for PosTagView {
    fn from(tag: &PosTag) -> Self {
        Self {
            x: tag.x,
            y: tag.y,
            name: tag.name.clone(),
        }
    }
}
