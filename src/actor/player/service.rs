//! Player-side domain logic: first-login seeding, response assembly, and
//! session-token issuance.

use crate::config::GameConfig;
use crate::entity::{
    FacilityState, GeneralState, PlayerEntity, ResourceState, RoleAttributeState, RoleState,
    GENERAL_NORMAL,
};
use crate::proto::{
    CityView, EnterServerResponse, GeneralView, MyPropertyResponse, PosTagListResponse,
    ResourceView, RoleView,
};
use chrono::Utc;
use uuid::Uuid;

pub const DEFAULT_NICK_NAME: &str = "momo";

/// Applies first-time defaults to a freshly created player.
///
/// Returns true when anything was set and therefore needs a synchronous
/// flush before the actor turns online.
pub fn ensure_initial_state(player: &mut PlayerEntity, config: &GameConfig) -> bool {
    let mut seeded = false;

    if player.profile().is_none() {
        seeded |= player.set_profile(initial_profile());
    }
    if player.resource().is_none() {
        seeded |= player.set_resource(initial_resource(config));
    }
    if player.attribute().is_none() {
        seeded |= player.set_attribute(initial_attribute());
    }
    if player.len_facilities() == 0 && !config.facilities.is_empty() {
        seeded |= player.replace_facilities(initial_facilities(config));
    }

    seeded
}

fn initial_profile() -> RoleState {
    RoleState {
        head_id: 0,
        sex: 0,
        nick_name: DEFAULT_NICK_NAME.to_string(),
        created_at: Some(Utc::now()),
        ..RoleState::default()
    }
}

fn initial_resource(config: &GameConfig) -> ResourceState {
    ResourceState {
        wood: config.role.wood,
        iron: config.role.iron,
        stone: config.role.stone,
        grain: config.role.grain,
        gold: config.role.gold,
        decree: config.role.decree,
    }
}

fn initial_attribute() -> RoleAttributeState {
    RoleAttributeState {
        parent_id: 0,
        ..RoleAttributeState::default()
    }
}

fn initial_facilities(config: &GameConfig) -> Vec<FacilityState> {
    config
        .facilities
        .iter()
        .map(|def| FacilityState {
            name: def.name.clone(),
            private_level: 0,
            ftype: def.ftype,
            up_time: 0,
        })
        .collect()
}

/// Tops the roster up to the configured count of starting generals.
/// Returns true when any general was drafted.
pub fn seed_generals(player: &mut PlayerEntity, config: &GameConfig) -> bool {
    let have = player.len_generals();
    let want = config.general.skill_limit;
    if have >= want {
        return false;
    }

    for index in have..want {
        let cfg_id = (index + 1) as i64;
        player.append_generals(GeneralState {
            id: cfg_id,
            cfg_id,
            power: config.general.power_limit,
            order_index: 0,
            city_id: 0,
            level: 0,
            cur_arms: 1,
            state: GENERAL_NORMAL,
            created_at: Some(Utc::now()),
            ..GeneralState::default()
        });
    }
    true
}

/// Opaque session token handed back on enter-server. Verification lives with
/// the account service; the core only issues it.
pub fn issue_session_token(player_id: i64) -> String {
    format!("{player_id}-{}", Uuid::new_v4().simple())
}

pub fn build_enter_server(player: &PlayerEntity) -> EnterServerResponse {
    EnterServerResponse {
        role: player.profile().map(RoleView::from).unwrap_or_default(),
        resource: player.resource().map(ResourceView::from).unwrap_or_default(),
        token: issue_session_token(player.player_id().value()),
        time_ms: Utc::now().timestamp_millis(),
    }
}

/// Player-local property view; cities are filled in from the world side when
/// that ask succeeds.
pub fn build_my_property(player: &PlayerEntity) -> MyPropertyResponse {
    let mut response = MyPropertyResponse {
        resource: player.resource().map(ResourceView::from).unwrap_or_default(),
        ..MyPropertyResponse::default()
    };

    player.for_each_buildings(|_, building| {
        response.buildings.push(building.into());
        true
    });
    player.for_each_generals(|_, general| {
        response.generals.push(general.into());
        true
    });
    player.for_each_armies(|_, armies| {
        for army in armies {
            response.armies.push(army.into());
        }
        true
    });

    response
}

pub fn build_my_generals(player: &PlayerEntity) -> Vec<GeneralView> {
    let mut generals = Vec::with_capacity(player.len_generals());
    player.for_each_generals(|_, general| {
        generals.push(general.into());
        true
    });
    generals
}

pub fn build_pos_tag_list(player: &PlayerEntity) -> PosTagListResponse {
    let mut response = PosTagListResponse::default();
    if let Some(attribute) = player.attribute() {
        attribute.for_each_pos_tags(|_, tag| {
            response.pos_tags.push(tag.into());
            true
        });
    }
    response
}

pub fn city_views(cities: &[crate::entity::CityState]) -> Vec<CityView> {
    cities.iter().map(CityView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;

    fn player() -> PlayerEntity {
        PlayerEntity::new(PlayerId::from_raw(42).unwrap())
    }

    #[test]
    fn seeding_is_idempotent() {
        let config = GameConfig::default();
        let mut p = player();

        assert!(ensure_initial_state(&mut p, &config));
        assert_eq!(p.profile().map(|r| r.nick_name().to_string()).as_deref(), Some("momo"));
        assert_eq!(p.resource().map(|r| r.wood()), Some(config.role.wood));
        assert_eq!(p.len_facilities(), config.facilities.len());

        // A second pass finds everything in place.
        assert!(!ensure_initial_state(&mut p, &config));
    }

    #[test]
    fn generals_top_up_to_configured_count() {
        let config = GameConfig::default();
        let mut p = player();

        assert!(seed_generals(&mut p, &config));
        assert_eq!(p.len_generals(), config.general.skill_limit);
        assert!(!seed_generals(&mut p, &config));

        p.for_each_generals(|_, g| {
            assert_eq!(g.power, config.general.power_limit);
            assert_eq!(g.state, GENERAL_NORMAL);
            true
        });
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let a = issue_session_token(42);
        let b = issue_session_token(42);
        assert_ne!(a, b);
        assert!(a.starts_with("42-"));
    }
}
