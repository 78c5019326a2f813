//! World aggregate: the shared tile grid plus per-player city holdings.

use super::slice_field;
use super::states::{CellState, CityState};
use super::to_change_value;
use super::trace::{CollectionChange, Trace};
use super::{EntitySnap, PersistEntity};
use crate::core::{CityId, PlayerId, WorldId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorldField {
    WorldMap,
    CitiesByPlayer,
    NextCityId,
}

/// Whole-document value view of a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub world_id: i64,
    pub world_map: Vec<CellState>,
    pub cities_by_player: BTreeMap<PlayerId, BTreeMap<CityId, CityState>>,
    pub next_city_id: i64,
}

/// Versioned deep-copy snapshot of a world.
#[derive(Debug, Clone)]
pub struct WorldSnap {
    pub version: u64,
    pub state: WorldState,
    pub dirty_fields: Vec<WorldField>,
    pub changes: BTreeMap<WorldField, CollectionChange>,
    /// Players whose city holdings changed since the previous snapshot.
    pub dirty_city_players: BTreeSet<PlayerId>,
}

impl EntitySnap for WorldSnap {
    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug)]
pub struct WorldEntity {
    world_id: WorldId,
    world_map: Vec<CellState>,
    cities_by_player: BTreeMap<PlayerId, BTreeMap<CityId, CityState>>,
    next_city_id: i64,
    trace: Trace<WorldField>,
}

impl WorldEntity {
    pub fn new(world_id: WorldId) -> Self {
        Self {
            world_id,
            world_map: Vec::new(),
            cities_by_player: BTreeMap::new(),
            next_city_id: 0,
            trace: Trace::default(),
        }
    }

    pub fn hydrate(world_id: WorldId, state: WorldState) -> Self {
        Self {
            world_id,
            world_map: state.world_map,
            cities_by_player: state.cities_by_player,
            next_city_id: state.next_city_id,
            trace: Trace::default(),
        }
    }

    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    slice_field!(world_map, WorldField::WorldMap, CellState,
        len = len_world_map, at = world_map_at, for_each = for_each_world_map,
        append = append_world_map, set_at = set_world_map_at, update_at = update_world_map_at,
        remove_at = remove_world_map_at, swap_remove_at = swap_remove_world_map_at,
        replace = replace_world_map, clear = clear_world_map);

    // --- cities keyed by owning player ----------------------------------

    pub fn cities_by_player(&self, player: PlayerId) -> Option<&BTreeMap<CityId, CityState>> {
        self.cities_by_player.get(&player)
    }

    pub fn len_cities_by_player(&self) -> usize {
        self.cities_by_player.len()
    }

    /// Stops early when the callback returns false.
    pub fn for_each_cities_by_player(
        &self,
        mut f: impl FnMut(PlayerId, &BTreeMap<CityId, CityState>) -> bool,
    ) {
        for (player, cities) in &self.cities_by_player {
            if !f(*player, cities) {
                break;
            }
        }
    }

    /// Puts a player's city holdings and marks the key dirty.
    pub fn put_cities_by_player(&mut self, player: PlayerId, cities: BTreeMap<CityId, CityState>) {
        self.trace.record_map_set(
            WorldField::CitiesByPlayer,
            player.to_string(),
            to_change_value(&cities),
        );
        self.trace
            .mark_key_dirty(WorldField::CitiesByPlayer, player.to_string());
        self.cities_by_player.insert(player, cities);
    }

    /// No-op when the player is absent; dirty only on deep change.
    pub fn update_cities_by_player(
        &mut self,
        player: PlayerId,
        f: impl FnOnce(&mut BTreeMap<CityId, CityState>),
    ) -> bool {
        let Some(cities) = self.cities_by_player.get_mut(&player) else {
            return false;
        };
        let before = cities.clone();
        f(cities);
        if *cities == before {
            return false;
        }
        let encoded = to_change_value(&*cities);
        self.trace
            .record_map_set(WorldField::CitiesByPlayer, player.to_string(), encoded);
        self.trace
            .mark_key_dirty(WorldField::CitiesByPlayer, player.to_string());
        true
    }

    pub fn put_many_cities_by_player(
        &mut self,
        entries: BTreeMap<PlayerId, BTreeMap<CityId, CityState>>,
    ) {
        for (player, cities) in entries {
            self.put_cities_by_player(player, cities);
        }
    }

    pub fn del_cities_by_player(&mut self, player: PlayerId) -> bool {
        if self.cities_by_player.remove(&player).is_none() {
            return false;
        }
        let key = player.to_string();
        self.trace
            .record_map_delete(WorldField::CitiesByPlayer, key.clone());
        self.trace.clear_key_dirty(WorldField::CitiesByPlayer, &key);
        true
    }

    pub fn del_many_cities_by_player(&mut self, players: impl IntoIterator<Item = PlayerId>) {
        for player in players {
            self.del_cities_by_player(player);
        }
    }

    pub fn clear_cities_by_player(&mut self) {
        self.trace.record_full_replace(WorldField::CitiesByPlayer);
        self.cities_by_player.clear();
    }

    pub fn replace_cities_by_player(
        &mut self,
        cities: BTreeMap<PlayerId, BTreeMap<CityId, CityState>>,
    ) -> bool {
        self.trace.record_full_replace(WorldField::CitiesByPlayer);
        self.cities_by_player = cities;
        true
    }

    // --- city-id allocator ----------------------------------------------

    pub fn next_city_id(&self) -> i64 {
        self.next_city_id
    }

    /// Hands out the next city id; the counter itself is persisted so
    /// allocation survives reload.
    pub fn allocate_city_id(&mut self) -> CityId {
        self.next_city_id = self.next_city_id.max(0) + 1;
        self.trace.touch(WorldField::NextCityId);
        CityId::from_positive(self.next_city_id)
    }

    // --- dirtiness and snapshots ----------------------------------------

    pub fn dirty(&self) -> bool {
        self.trace.dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.trace.clear();
    }

    pub fn state(&self) -> WorldState {
        WorldState {
            world_id: self.world_id.value(),
            world_map: self.world_map.clone(),
            cities_by_player: self.cities_by_player.clone(),
            next_city_id: self.next_city_id,
        }
    }
}

impl PersistEntity for WorldEntity {
    type Id = WorldId;
    type Snap = WorldSnap;

    fn entity_id(&self) -> WorldId {
        self.world_id
    }

    fn dirty(&self) -> bool {
        self.dirty()
    }

    fn build_snapshot(&mut self, version: u64) -> Option<WorldSnap> {
        if !self.dirty() {
            return None;
        }

        let dirty_city_players = self
            .trace
            .dirty_keys(WorldField::CitiesByPlayer)
            .iter()
            .filter_map(|key| key.parse::<i64>().ok())
            .filter_map(PlayerId::from_raw)
            .collect();

        let state = self.state();
        let (dirty_fields, changes) = self.trace.drain();

        Some(WorldSnap {
            version,
            state,
            dirty_fields,
            changes,
            dirty_city_players,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wid(raw: i64) -> WorldId {
        WorldId::from_raw(raw).unwrap()
    }

    fn pid(raw: i64) -> PlayerId {
        PlayerId::from_raw(raw).unwrap()
    }

    fn city(id: CityId) -> CityState {
        CityState {
            city_id: id,
            name: "camp".into(),
            union_id: 0,
            union_name: String::new(),
            parent_id: 0,
            x: 1,
            y: 2,
            is_main: true,
            level: 1,
            cur_durable: 100,
            max_durable: 100,
            occupy_time: None,
        }
    }

    #[test]
    fn put_cities_marks_player_key_dirty() {
        let mut world = WorldEntity::new(wid(1));
        let owner = pid(42);
        let id = world.allocate_city_id();
        world.put_cities_by_player(owner, BTreeMap::from([(id, city(id))]));

        let snap = world.build_snapshot(1).unwrap();
        assert!(snap.dirty_city_players.contains(&owner));
        assert!(snap.dirty_fields.contains(&WorldField::CitiesByPlayer));
        assert!(snap.dirty_fields.contains(&WorldField::NextCityId));
        assert!(!world.dirty());
    }

    #[test]
    fn delete_clears_the_dirty_key() {
        let mut world = WorldEntity::new(wid(1));
        let owner = pid(7);
        let id = world.allocate_city_id();
        world.put_cities_by_player(owner, BTreeMap::from([(id, city(id))]));
        world.del_cities_by_player(owner);

        let snap = world.build_snapshot(1).unwrap();
        assert!(snap.dirty_city_players.is_empty());
        let change = &snap.changes[&WorldField::CitiesByPlayer];
        assert!(change.map_delete.contains("7"));
        assert!(!change.map_set.contains_key("7"));
    }

    #[test]
    fn city_id_allocation_is_monotonic_and_persisted() {
        let mut world = WorldEntity::new(wid(1));
        let a = world.allocate_city_id();
        let b = world.allocate_city_id();
        assert!(a < b);

        let state = world.state();
        let mut reloaded = WorldEntity::hydrate(wid(1), state);
        let c = reloaded.allocate_city_id();
        assert!(b < c);
    }

    #[test]
    fn map_seed_is_a_full_replace() {
        let mut world = WorldEntity::new(wid(1));
        world.replace_world_map(vec![CellState::default(); 4]);
        let snap = world.build_snapshot(1).unwrap();
        assert!(snap.changes[&WorldField::WorldMap].full_replace);
        assert_eq!(snap.state.world_map.len(), 4);
    }
}
