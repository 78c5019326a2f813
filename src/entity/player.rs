//! Player aggregate: nested profile/resource/attribute sub-entities, tracked
//! collections, and versioned persist snapshots.

use super::aggregates::{ResourceEntity, RoleAttributeEntity, RoleEntity};
use super::slice_field;
use super::states::{
    ArmyState, BuildingState, FacilityState, GeneralState, ResourceState, RoleAttributeState,
    RoleState, WarReportState,
};
use super::to_change_value;
use super::trace::{CollectionChange, Trace};
use super::{EntitySnap, PersistEntity};
use crate::core::{CityId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level field tags of the player aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlayerField {
    Profile,
    Resource,
    Attribute,
    Buildings,
    Generals,
    Facilities,
    WarReports,
    Armies,
}

/// Whole-document value view of a player; what repositories persist and
/// rehydrate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player_id: i64,
    pub role: RoleState,
    pub resource: ResourceState,
    pub attribute: RoleAttributeState,
    pub buildings: Vec<BuildingState>,
    pub generals: Vec<GeneralState>,
    pub facilities: Vec<FacilityState>,
    pub war_reports: Vec<WarReportState>,
    pub armies: BTreeMap<CityId, Vec<ArmyState>>,
}

/// Versioned deep-copy snapshot of a player.
#[derive(Debug, Clone)]
pub struct PlayerSnap {
    pub version: u64,
    pub state: PlayerState,
    pub dirty_fields: Vec<PlayerField>,
    pub changes: BTreeMap<PlayerField, CollectionChange>,
}

impl EntitySnap for PlayerSnap {
    fn version(&self) -> u64 {
        self.version
    }
}

/// In-memory player entity. All mutation happens on the owning actor's
/// mailbox; everything else reads snapshots.
#[derive(Debug)]
pub struct PlayerEntity {
    player_id: PlayerId,
    profile: Option<RoleEntity>,
    resource: Option<ResourceEntity>,
    attribute: Option<RoleAttributeEntity>,
    buildings: Vec<BuildingState>,
    generals: Vec<GeneralState>,
    facilities: Vec<FacilityState>,
    war_reports: Vec<WarReportState>,
    armies: BTreeMap<CityId, Vec<ArmyState>>,
    trace: Trace<PlayerField>,
}

impl PlayerEntity {
    /// Freshly constructed entity: only the id is set, nothing is dirty, and
    /// first-login defaults have not been applied yet.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            profile: None,
            resource: None,
            attribute: None,
            buildings: Vec::new(),
            generals: Vec::new(),
            facilities: Vec::new(),
            war_reports: Vec::new(),
            armies: BTreeMap::new(),
            trace: Trace::default(),
        }
    }

    /// Rebuilds the entity from a persisted document; the trace starts clean.
    pub fn hydrate(player_id: PlayerId, state: PlayerState) -> Self {
        Self {
            player_id,
            profile: Some(RoleEntity::hydrate(state.role)),
            resource: Some(ResourceEntity::hydrate(state.resource)),
            attribute: Some(RoleAttributeEntity::hydrate(state.attribute)),
            buildings: state.buildings,
            generals: state.generals,
            facilities: state.facilities,
            war_reports: state.war_reports,
            armies: state.armies,
            trace: Trace::default(),
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    // --- nested aggregates ---------------------------------------------

    pub fn profile(&self) -> Option<&RoleEntity> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, state: RoleState) -> bool {
        if self.profile.as_ref().is_some_and(|p| p.state() == state) {
            return false;
        }
        self.profile = Some(RoleEntity::hydrate(state));
        self.trace.touch(PlayerField::Profile);
        true
    }

    /// Creates the profile if absent, then applies the mutator.
    pub fn update_profile(&mut self, f: impl FnOnce(&mut RoleEntity)) {
        let profile = self.profile.get_or_insert_with(RoleEntity::default);
        f(profile);
        self.trace.touch(PlayerField::Profile);
    }

    pub fn resource(&self) -> Option<&ResourceEntity> {
        self.resource.as_ref()
    }

    pub fn set_resource(&mut self, state: ResourceState) -> bool {
        if self.resource.as_ref().is_some_and(|r| r.state() == state) {
            return false;
        }
        self.resource = Some(ResourceEntity::hydrate(state));
        self.trace.touch(PlayerField::Resource);
        true
    }

    pub fn update_resource(&mut self, f: impl FnOnce(&mut ResourceEntity)) {
        let resource = self.resource.get_or_insert_with(ResourceEntity::default);
        f(resource);
        self.trace.touch(PlayerField::Resource);
    }

    pub fn attribute(&self) -> Option<&RoleAttributeEntity> {
        self.attribute.as_ref()
    }

    pub fn set_attribute(&mut self, state: RoleAttributeState) -> bool {
        if self.attribute.as_ref().is_some_and(|a| a.state() == state) {
            return false;
        }
        self.attribute = Some(RoleAttributeEntity::hydrate(state));
        self.trace.touch(PlayerField::Attribute);
        true
    }

    pub fn update_attribute(&mut self, f: impl FnOnce(&mut RoleAttributeEntity)) {
        let attribute = self
            .attribute
            .get_or_insert_with(RoleAttributeEntity::default);
        f(attribute);
        self.trace.touch(PlayerField::Attribute);
    }

    // --- tracked slices -------------------------------------------------

    slice_field!(buildings, PlayerField::Buildings, BuildingState,
        len = len_buildings, at = building_at, for_each = for_each_buildings,
        append = append_buildings, set_at = set_buildings_at, update_at = update_buildings_at,
        remove_at = remove_buildings_at, swap_remove_at = swap_remove_buildings_at,
        replace = replace_buildings, clear = clear_buildings);

    slice_field!(generals, PlayerField::Generals, GeneralState,
        len = len_generals, at = general_at, for_each = for_each_generals,
        append = append_generals, set_at = set_generals_at, update_at = update_generals_at,
        remove_at = remove_generals_at, swap_remove_at = swap_remove_generals_at,
        replace = replace_generals, clear = clear_generals);

    slice_field!(facilities, PlayerField::Facilities, FacilityState,
        len = len_facilities, at = facility_at, for_each = for_each_facilities,
        append = append_facilities, set_at = set_facilities_at, update_at = update_facilities_at,
        remove_at = remove_facilities_at, swap_remove_at = swap_remove_facilities_at,
        replace = replace_facilities, clear = clear_facilities);

    slice_field!(war_reports, PlayerField::WarReports, WarReportState,
        len = len_war_reports, at = war_report_at, for_each = for_each_war_reports,
        append = append_war_reports, set_at = set_war_reports_at, update_at = update_war_reports_at,
        remove_at = remove_war_reports_at, swap_remove_at = swap_remove_war_reports_at,
        replace = replace_war_reports, clear = clear_war_reports);

    // --- armies map (keyed by city) -------------------------------------

    pub fn armies(&self, city: CityId) -> Option<&Vec<ArmyState>> {
        self.armies.get(&city)
    }

    pub fn len_armies(&self) -> usize {
        self.armies.len()
    }

    /// Stops early when the callback returns false.
    pub fn for_each_armies(&self, mut f: impl FnMut(CityId, &Vec<ArmyState>) -> bool) {
        for (city, armies) in &self.armies {
            if !f(*city, armies) {
                break;
            }
        }
    }

    pub fn put_armies(&mut self, city: CityId, armies: Vec<ArmyState>) {
        self.trace
            .record_map_set(PlayerField::Armies, city.to_string(), to_change_value(&armies));
        self.armies.insert(city, armies);
    }

    pub fn put_many_armies(&mut self, entries: BTreeMap<CityId, Vec<ArmyState>>) {
        for (city, armies) in entries {
            self.put_armies(city, armies);
        }
    }

    /// No-op when the city is absent; dirty only on deep change.
    pub fn update_armies(&mut self, city: CityId, f: impl FnOnce(&mut Vec<ArmyState>)) -> bool {
        let Some(armies) = self.armies.get_mut(&city) else {
            return false;
        };
        let before = armies.clone();
        f(armies);
        if *armies == before {
            return false;
        }
        let encoded = to_change_value(&*armies);
        self.trace
            .record_map_set(PlayerField::Armies, city.to_string(), encoded);
        true
    }

    pub fn del_armies(&mut self, city: CityId) -> bool {
        if self.armies.remove(&city).is_none() {
            return false;
        }
        self.trace
            .record_map_delete(PlayerField::Armies, city.to_string());
        true
    }

    pub fn del_many_armies(&mut self, cities: impl IntoIterator<Item = CityId>) {
        for city in cities {
            self.del_armies(city);
        }
    }

    pub fn replace_armies(&mut self, armies: BTreeMap<CityId, Vec<ArmyState>>) -> bool {
        self.trace.record_full_replace(PlayerField::Armies);
        self.armies = armies;
        true
    }

    pub fn clear_armies(&mut self) {
        self.trace.record_full_replace(PlayerField::Armies);
        self.armies.clear();
    }

    // --- dirtiness and snapshots ----------------------------------------

    pub fn dirty(&self) -> bool {
        self.trace.dirty()
            || self.profile.as_ref().is_some_and(RoleEntity::dirty)
            || self.resource.as_ref().is_some_and(ResourceEntity::dirty)
            || self
                .attribute
                .as_ref()
                .is_some_and(RoleAttributeEntity::dirty)
    }

    pub fn clear_dirty(&mut self) {
        self.trace.clear();
        if let Some(profile) = self.profile.as_mut() {
            profile.clear_dirty();
        }
        if let Some(resource) = self.resource.as_mut() {
            resource.clear_dirty();
        }
        if let Some(attribute) = self.attribute.as_mut() {
            attribute.clear_dirty();
        }
    }

    /// Deep-copies the whole aggregate; absent sub-aggregates become zero
    /// values.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            player_id: self.player_id.value(),
            role: self
                .profile
                .as_ref()
                .map(RoleEntity::state)
                .unwrap_or_default(),
            resource: self
                .resource
                .as_ref()
                .map(ResourceEntity::state)
                .unwrap_or_default(),
            attribute: self
                .attribute
                .as_ref()
                .map(RoleAttributeEntity::state)
                .unwrap_or_default(),
            buildings: self.buildings.clone(),
            generals: self.generals.clone(),
            facilities: self.facilities.clone(),
            war_reports: self.war_reports.clone(),
            armies: self.armies.clone(),
        }
    }
}

impl PersistEntity for PlayerEntity {
    type Id = PlayerId;
    type Snap = PlayerSnap;

    fn entity_id(&self) -> PlayerId {
        self.player_id
    }

    fn dirty(&self) -> bool {
        self.dirty()
    }

    fn build_snapshot(&mut self, version: u64) -> Option<PlayerSnap> {
        if !self.dirty() {
            return None;
        }

        // Fold sub-aggregate dirtiness into the top-level field list before
        // draining the trace.
        if self.profile.as_ref().is_some_and(RoleEntity::dirty) {
            self.trace.touch(PlayerField::Profile);
        }
        if self.resource.as_ref().is_some_and(ResourceEntity::dirty) {
            self.trace.touch(PlayerField::Resource);
        }
        if self
            .attribute
            .as_ref()
            .is_some_and(RoleAttributeEntity::dirty)
        {
            self.trace.touch(PlayerField::Attribute);
        }

        let state = self.state();
        let (dirty_fields, changes) = self.trace.drain();
        self.clear_dirty();

        Some(PlayerSnap {
            version,
            state,
            dirty_fields,
            changes,
        })
    }
}
