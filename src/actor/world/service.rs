//! World-side domain logic invoked by the handlers.

use crate::config::GameConfig;
use crate::core::PlayerId;
use crate::entity::{CellState, CityState, WorldEntity};
use crate::proto::{HwCreateCity, WhCreateCity, WhMyCities, WhWorldMap};
use chrono::Utc;
use std::collections::BTreeMap;

/// Builds the initial tile grid from the static map layout.
pub fn seed_world_map(config: &GameConfig) -> Vec<CellState> {
    config
        .map
        .cells
        .iter()
        .map(|seed| CellState {
            cell_type: seed.cell_type,
            name: seed.name.clone(),
            level: seed.level,
            defender: seed.defender,
            durable: seed.durable,
            grain: seed.grain,
            wood: seed.wood,
            iron: seed.iron,
            stone: seed.stone,
        })
        .collect()
}

/// Allocates the player's starting city, or returns the existing main city so
/// a replayed bootstrap stays idempotent. A zero `city_id` means rejection.
pub fn create_city(
    world: &mut WorldEntity,
    config: &GameConfig,
    request: &HwCreateCity,
) -> WhCreateCity {
    let Some(player) = PlayerId::from_raw(request.player_id) else {
        return WhCreateCity::default();
    };

    if let Some(existing) = world
        .cities_by_player(player)
        .and_then(|cities| cities.values().find(|city| city.is_main))
    {
        return WhCreateCity {
            city_id: existing.city_id.value(),
            x: existing.x,
            y: existing.y,
        };
    }

    let city_id = world.allocate_city_id();
    let (x, y) = place_city(config, city_id.value());
    let city = CityState {
        city_id,
        name: request.nick_name.clone(),
        union_id: 0,
        union_name: String::new(),
        parent_id: 0,
        x,
        y,
        is_main: true,
        level: 1,
        cur_durable: config.city.durable,
        max_durable: config.city.durable,
        occupy_time: Some(Utc::now()),
    };
    world.put_cities_by_player(player, BTreeMap::from([(city_id, city)]));

    WhCreateCity {
        city_id: city_id.value(),
        x,
        y,
    }
}

/// Deterministic placement: fold the allocated id over the map bounds.
fn place_city(config: &GameConfig, raw_id: i64) -> (i64, i64) {
    let width = config.map.width.max(1);
    let height = config.map.height.max(1);
    (raw_id % width, (raw_id / width) % height)
}

pub fn world_map(world: &WorldEntity) -> WhWorldMap {
    let mut cells = Vec::with_capacity(world.len_world_map());
    world.for_each_world_map(|_, cell| {
        cells.push(cell.clone());
        true
    });
    WhWorldMap { cells }
}

/// Cities of one player, ordered by city id.
pub fn my_cities(world: &WorldEntity, player_id: i64) -> WhMyCities {
    let mut out = WhMyCities::default();
    let Some(player) = PlayerId::from_raw(player_id) else {
        return out;
    };
    if let Some(cities) = world.cities_by_player(player) {
        out.cities = cities.values().cloned().collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldId;

    fn world() -> WorldEntity {
        WorldEntity::new(WorldId::from_raw(1).unwrap())
    }

    fn request(player_id: i64) -> HwCreateCity {
        HwCreateCity {
            world_id: 1,
            player_id,
            nick_name: "momo".into(),
        }
    }

    #[test]
    fn create_city_allocates_one_main_city_per_player() {
        let config = GameConfig::default();
        let mut world = world();

        let first = create_city(&mut world, &config, &request(42));
        assert!(first.city_id > 0);

        let replay = create_city(&mut world, &config, &request(42));
        assert_eq!(replay.city_id, first.city_id);
        assert_eq!(replay.x, first.x);

        let owner = PlayerId::from_raw(42).unwrap();
        assert_eq!(world.cities_by_player(owner).map(BTreeMap::len), Some(1));
    }

    #[test]
    fn create_city_rejects_non_positive_player() {
        let config = GameConfig::default();
        let mut world = world();
        let reply = create_city(&mut world, &config, &request(0));
        assert_eq!(reply.city_id, 0);
        assert!(!world.dirty());
    }

    #[test]
    fn placement_stays_inside_map_bounds() {
        let config = GameConfig::default();
        let mut world = world();
        for player in 1..=20 {
            let reply = create_city(&mut world, &config, &request(player));
            assert!(reply.x >= 0 && reply.x < config.map.width);
            assert!(reply.y >= 0 && reply.y < config.map.height);
        }
    }

    #[test]
    fn my_cities_orders_by_city_id() {
        let config = GameConfig::default();
        let mut world = world();
        create_city(&mut world, &config, &request(7));
        let listed = my_cities(&world, 7);
        assert_eq!(listed.cities.len(), 1);
        assert!(my_cities(&world, 8).cities.is_empty());
        assert!(my_cities(&world, -1).cities.is_empty());
    }
}
