//! Scalar sub-entities owned by the player aggregate.
//!
//! Each one carries its own trace; the parent folds their dirtiness into its
//! snapshot and clears them together with its own trace.

use super::states::{PosTag, ResourceState, RoleAttributeState, RoleState};
use super::to_change_value;
use super::trace::Trace;
use chrono::{DateTime, Utc};

macro_rules! scalar_setter {
    ($(#[$doc:meta])* $setter:ident, $field:ident: $ty:ty, $tag:expr) => {
        $(#[$doc])*
        pub fn $setter(&mut self, value: $ty) -> bool {
            if self.state.$field == value {
                return false;
            }
            self.state.$field = value;
            self.trace.touch($tag);
            true
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoleField {
    HeadId,
    Sex,
    NickName,
    Balance,
    Profile,
    LoginTime,
    LogoutTime,
    CreatedAt,
}

/// Role profile with per-field change tracking.
#[derive(Debug, Clone, Default)]
pub struct RoleEntity {
    state: RoleState,
    trace: Trace<RoleField>,
}

impl RoleEntity {
    pub fn hydrate(state: RoleState) -> Self {
        Self {
            state,
            trace: Trace::default(),
        }
    }

    pub fn state(&self) -> RoleState {
        self.state.clone()
    }

    pub fn head_id(&self) -> i64 {
        self.state.head_id
    }

    pub fn sex(&self) -> i8 {
        self.state.sex
    }

    pub fn nick_name(&self) -> &str {
        &self.state.nick_name
    }

    pub fn balance(&self) -> i64 {
        self.state.balance
    }

    pub fn profile_text(&self) -> &str {
        &self.state.profile
    }

    pub fn login_time(&self) -> Option<DateTime<Utc>> {
        self.state.login_time
    }

    pub fn logout_time(&self) -> Option<DateTime<Utc>> {
        self.state.logout_time
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.state.created_at
    }

    scalar_setter!(set_head_id, head_id: i64, RoleField::HeadId);
    scalar_setter!(set_sex, sex: i8, RoleField::Sex);
    scalar_setter!(set_nick_name, nick_name: String, RoleField::NickName);
    scalar_setter!(set_balance, balance: i64, RoleField::Balance);
    scalar_setter!(set_profile_text, profile: String, RoleField::Profile);
    scalar_setter!(
        /// Instant equality; a re-login at the same tick is not a change.
        set_login_time, login_time: Option<DateTime<Utc>>, RoleField::LoginTime
    );
    scalar_setter!(set_logout_time, logout_time: Option<DateTime<Utc>>, RoleField::LogoutTime);
    scalar_setter!(set_created_at, created_at: Option<DateTime<Utc>>, RoleField::CreatedAt);

    pub fn dirty(&self) -> bool {
        self.trace.dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.trace.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceField {
    Wood,
    Iron,
    Stone,
    Grain,
    Gold,
    Decree,
}

/// Resource wallet with per-field change tracking.
#[derive(Debug, Clone, Default)]
pub struct ResourceEntity {
    state: ResourceState,
    trace: Trace<ResourceField>,
}

impl ResourceEntity {
    pub fn hydrate(state: ResourceState) -> Self {
        Self {
            state,
            trace: Trace::default(),
        }
    }

    pub fn state(&self) -> ResourceState {
        self.state.clone()
    }

    pub fn wood(&self) -> i64 {
        self.state.wood
    }

    pub fn iron(&self) -> i64 {
        self.state.iron
    }

    pub fn stone(&self) -> i64 {
        self.state.stone
    }

    pub fn grain(&self) -> i64 {
        self.state.grain
    }

    pub fn gold(&self) -> i64 {
        self.state.gold
    }

    pub fn decree(&self) -> i64 {
        self.state.decree
    }

    scalar_setter!(set_wood, wood: i64, ResourceField::Wood);
    scalar_setter!(set_iron, iron: i64, ResourceField::Iron);
    scalar_setter!(set_stone, stone: i64, ResourceField::Stone);
    scalar_setter!(set_grain, grain: i64, ResourceField::Grain);
    scalar_setter!(set_gold, gold: i64, ResourceField::Gold);
    scalar_setter!(set_decree, decree: i64, ResourceField::Decree);

    pub fn dirty(&self) -> bool {
        self.trace.dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.trace.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttributeField {
    UnionId,
    ParentId,
    CollectTimes,
    LastCollectTime,
    PosTags,
}

/// Union / marker attributes; `pos_tags` is a tracked slice field.
#[derive(Debug, Clone, Default)]
pub struct RoleAttributeEntity {
    state: RoleAttributeState,
    trace: Trace<AttributeField>,
}

impl RoleAttributeEntity {
    pub fn hydrate(state: RoleAttributeState) -> Self {
        Self {
            state,
            trace: Trace::default(),
        }
    }

    pub fn state(&self) -> RoleAttributeState {
        self.state.clone()
    }

    pub fn union_id(&self) -> i64 {
        self.state.union_id
    }

    pub fn parent_id(&self) -> i64 {
        self.state.parent_id
    }

    pub fn collect_times(&self) -> i8 {
        self.state.collect_times
    }

    pub fn last_collect_time(&self) -> Option<DateTime<Utc>> {
        self.state.last_collect_time
    }

    scalar_setter!(set_union_id, union_id: i64, AttributeField::UnionId);
    scalar_setter!(set_parent_id, parent_id: i64, AttributeField::ParentId);
    scalar_setter!(set_collect_times, collect_times: i8, AttributeField::CollectTimes);
    scalar_setter!(
        set_last_collect_time,
        last_collect_time: Option<DateTime<Utc>>,
        AttributeField::LastCollectTime
    );

    pub fn len_pos_tags(&self) -> usize {
        self.state.pos_tags.len()
    }

    pub fn pos_tag_at(&self, index: usize) -> Option<&PosTag> {
        self.state.pos_tags.get(index)
    }

    pub fn for_each_pos_tags(&self, mut f: impl FnMut(usize, &PosTag) -> bool) {
        for (i, tag) in self.state.pos_tags.iter().enumerate() {
            if !f(i, tag) {
                break;
            }
        }
    }

    pub fn append_pos_tags(&mut self, tag: PosTag) {
        self.trace
            .record_slice_append(AttributeField::PosTags, to_change_value(&tag));
        self.state.pos_tags.push(tag);
    }

    pub fn remove_pos_tags_at(&mut self, index: usize) -> Option<PosTag> {
        if index >= self.state.pos_tags.len() {
            return None;
        }
        self.trace
            .record_slice_remove_at(AttributeField::PosTags, index);
        Some(self.state.pos_tags.remove(index))
    }

    pub fn replace_pos_tags(&mut self, tags: Vec<PosTag>) -> bool {
        self.trace.record_full_replace(AttributeField::PosTags);
        self.state.pos_tags = tags;
        true
    }

    pub fn dirty(&self) -> bool {
        self.trace.dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.trace.clear();
    }
}
