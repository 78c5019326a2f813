//! End-to-end scenarios through both runtime facades: login, bootstrap,
//! seq dedup, and the degraded cross-service paths.

use std::sync::{Arc, Mutex};
use stronghold::actor::Recipient;
use stronghold::config::GameConfig;
use stronghold::entity::CityState;
use stronghold::proto::{
    CreateRoleRequest, HwCreateCity, HwMyCities, HwWorldMap, PlayerReqBody, PlayerRespBody,
    PlayerRequest, WhCreateCity, WhMyCities, WorldMessage, WorldReply, WorldRequest,
    WorldRespBody,
};
use stronghold::{
    AskError, CityId, MemoryPlayerRepository, MemoryWorldRepository, PlayerRuntime, WorldId,
    WorldRuntime, DEFAULT_ASK_TIMEOUT,
};

fn config() -> Arc<GameConfig> {
    Arc::new(GameConfig::default())
}

fn request(player_id: i64, seq: i64, body: PlayerReqBody) -> Option<PlayerRequest> {
    Some(PlayerRequest {
        player_id,
        world_id: 1,
        seq,
        body: Some(body),
    })
}

/// Full two-service stack: a real world runtime wired into the player
/// runtime through its logical address.
struct Stack {
    player: PlayerRuntime,
    world: WorldRuntime,
    player_repo: Arc<MemoryPlayerRepository>,
    world_repo: Arc<MemoryWorldRepository>,
}

fn full_stack() -> Stack {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = config();
    let world_repo = Arc::new(MemoryWorldRepository::new());
    let world = WorldRuntime::new(world_repo.clone(), config.clone(), DEFAULT_ASK_TIMEOUT);
    let player_repo = Arc::new(MemoryPlayerRepository::new());
    let player = PlayerRuntime::new(
        player_repo.clone(),
        world.world_recipient(),
        WorldId::from_raw(1).unwrap(),
        config,
        DEFAULT_ASK_TIMEOUT,
    );
    Stack {
        player,
        world,
        player_repo,
        world_repo,
    }
}

fn player_runtime_with(world: Recipient<WorldMessage, WorldReply>) -> PlayerRuntime {
    PlayerRuntime::new(
        Arc::new(MemoryPlayerRepository::new()),
        world,
        WorldId::from_raw(1).unwrap(),
        config(),
        DEFAULT_ASK_TIMEOUT,
    )
}

#[tokio::test]
async fn login_then_enter_seeds_defaults_and_reports_them() {
    let stack = full_stack();
    let defaults = GameConfig::default().role;

    let response = stack
        .player
        .handle(request(42, 1, PlayerReqBody::EnterServer(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok, "{:?}", response.result);

    let Some(PlayerRespBody::EnterServer(body)) = response.body else {
        panic!("expected enter-server body, got {:?}", response.body);
    };
    assert_eq!(body.role.nick_name, "momo");
    assert_eq!(body.role.sex, 0);
    assert_eq!(body.role.head_id, 0);
    assert!(!body.token.is_empty());
    assert!(body.time_ms > 0);
    assert_eq!(body.resource.wood, defaults.wood);
    assert_eq!(body.resource.decree, defaults.decree);

    // The seed reached durability before the actor turned online.
    let doc = stack
        .player_repo
        .document(stronghold::PlayerId::from_raw(42).unwrap())
        .expect("seed must be persisted");
    assert!(doc.role.created_at.is_some());
    assert_eq!(doc.resource.grain, defaults.grain);

    // My-property echoes the same resource values.
    let response = stack
        .player
        .handle(request(42, 2, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();
    let Some(PlayerRespBody::MyProperty(body)) = response.body else {
        panic!("expected my-property body");
    };
    assert_eq!(body.resource.wood, defaults.wood);
    assert_eq!(body.resource.gold, defaults.gold);

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn bootstrap_allocates_exactly_one_city_visible_in_my_property() {
    let stack = full_stack();

    let response = stack
        .player
        .handle(request(42, 1, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(PlayerRespBody::MyProperty(body)) = response.body else {
        panic!("expected my-property body");
    };
    assert_eq!(body.cities.len(), 1);
    assert!(body.cities[0].is_main);

    // A second login replays the bootstrap; still one city.
    let response = stack
        .player
        .handle(request(42, 2, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();
    let Some(PlayerRespBody::MyProperty(body)) = response.body else {
        panic!("expected my-property body");
    };
    assert_eq!(body.cities.len(), 1);

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn scripted_world_bootstrap_lands_city_seven() {
    let cities: Arc<Mutex<Vec<CityState>>> = Arc::new(Mutex::new(Vec::new()));
    let script = cities.clone();
    let world = Recipient::from_fn(move |msg, _timeout| {
        let cities = script.clone();
        Box::pin(async move {
            Ok(match msg {
                WorldMessage::CreateCity(request) => {
                    cities.lock().unwrap().push(CityState {
                        city_id: CityId::from_raw(7).unwrap(),
                        name: request.nick_name,
                        union_id: 0,
                        union_name: String::new(),
                        parent_id: 0,
                        x: 10,
                        y: 20,
                        is_main: true,
                        level: 1,
                        cur_durable: 100,
                        max_durable: 100,
                        occupy_time: None,
                    });
                    WorldReply::CreateCity(WhCreateCity {
                        city_id: 7,
                        x: 10,
                        y: 20,
                    })
                }
                WorldMessage::MyCities(_) => WorldReply::MyCities(WhMyCities {
                    cities: cities.lock().unwrap().clone(),
                }),
                WorldMessage::WorldMap(_) => WorldReply::fail("not scripted"),
            })
        })
    });

    let runtime = player_runtime_with(world);
    let response = runtime
        .handle(request(42, 1, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(PlayerRespBody::MyProperty(body)) = response.body else {
        panic!("expected my-property body");
    };
    assert_eq!(body.cities.len(), 1);
    assert_eq!(body.cities[0].city_id, 7);

    runtime.shutdown().await;
}

#[tokio::test]
async fn duplicate_seq_is_accepted_exactly_once() {
    let stack = full_stack();

    let first = stack
        .player
        .handle(request(42, 100, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();
    let second = stack
        .player
        .handle(request(42, 100, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();

    assert!(first.result.ok);
    assert!(!second.result.ok);
    assert_eq!(second.result.reason, "duplicate seq");

    for bad_seq in [0, -5] {
        let response = stack
            .player
            .handle(request(42, bad_seq, PlayerReqBody::MyProperty(Default::default())))
            .await
            .unwrap();
        assert!(!response.result.ok);
        assert_eq!(response.result.reason, "invalid seq");
    }

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn create_role_persists_before_responding() {
    let stack = full_stack();

    let response = stack
        .player
        .handle(request(
            42,
            1,
            PlayerReqBody::CreateRole(CreateRoleRequest {
                nick_name: "zhao".into(),
                sex: 1,
                head_id: 3,
            }),
        ))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(PlayerRespBody::CreateRole(body)) = response.body else {
        panic!("expected create-role body");
    };
    assert_eq!(body.role.nick_name, "zhao");

    let doc = stack
        .player_repo
        .document(stronghold::PlayerId::from_raw(42).unwrap())
        .unwrap();
    assert_eq!(doc.role.nick_name, "zhao");
    assert_eq!(doc.role.sex, 1);

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn my_generals_drafts_the_starting_roster_once() {
    let stack = full_stack();
    let want = GameConfig::default().general.skill_limit;

    for seq in 1..=2 {
        let response = stack
            .player
            .handle(request(42, seq, PlayerReqBody::MyGenerals(Default::default())))
            .await
            .unwrap();
        let Some(PlayerRespBody::MyGenerals(body)) = response.body else {
            panic!("expected my-generals body");
        };
        assert_eq!(body.generals.len(), want);
    }

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn world_map_flows_through_the_peer_ask() {
    let stack = full_stack();
    let cells = GameConfig::default().map.cells.len();

    let response = stack
        .player
        .handle(request(42, 1, PlayerReqBody::WorldMap(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(PlayerRespBody::WorldMap(body)) = response.body else {
        panic!("expected world-map body");
    };
    assert_eq!(body.cells.len(), cells);

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn my_property_degrades_to_local_data_when_world_asks_fail() {
    // Bootstrap succeeds once, then the world goes dark.
    let world = Recipient::from_fn(move |msg, _timeout| {
        Box::pin(async move {
            match msg {
                WorldMessage::CreateCity(_) => Ok(WorldReply::CreateCity(WhCreateCity {
                    city_id: 9,
                    x: 1,
                    y: 1,
                })),
                _ => Err(AskError::Timeout),
            }
        })
    });

    let runtime = player_runtime_with(world);
    let response = runtime
        .handle(request(42, 1, PlayerReqBody::MyProperty(Default::default())))
        .await
        .unwrap();

    // Still a successful biz result, just without world-side cities.
    assert!(response.result.ok);
    let Some(PlayerRespBody::MyProperty(body)) = response.body else {
        panic!("expected my-property body");
    };
    assert!(body.cities.is_empty());
    assert_eq!(
        body.resource.wood,
        GameConfig::default().role.wood,
        "local data must survive the degradation"
    );

    let map_response = runtime
        .handle(request(42, 2, PlayerReqBody::WorldMap(Default::default())))
        .await
        .unwrap();
    assert!(!map_response.result.ok);

    runtime.shutdown().await;
}

#[tokio::test]
async fn failed_bootstrap_reports_loading_and_recovers_on_retry() {
    let attempts = Arc::new(Mutex::new(0u32));
    let counter = attempts.clone();
    // First create-city ask dies, the retry succeeds.
    let world = Recipient::from_fn(move |msg, _timeout| {
        let attempts = counter.clone();
        Box::pin(async move {
            match msg {
                WorldMessage::CreateCity(_) => {
                    let mut attempts = attempts.lock().unwrap();
                    *attempts += 1;
                    if *attempts == 1 {
                        Err(AskError::Timeout)
                    } else {
                        Ok(WorldReply::CreateCity(WhCreateCity {
                            city_id: 5,
                            x: 0,
                            y: 0,
                        }))
                    }
                }
                WorldMessage::MyCities(_) => Ok(WorldReply::MyCities(WhMyCities::default())),
                WorldMessage::WorldMap(_) => Ok(WorldReply::fail("unused")),
            }
        })
    });

    let runtime = player_runtime_with(world);

    // Spawn-time init fails; the first request retries init and succeeds.
    let response = runtime
        .handle(request(42, 1, PlayerReqBody::EnterServer(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok, "{:?}", response.result);
    assert_eq!(*attempts.lock().unwrap(), 2);

    runtime.shutdown().await;
}

#[tokio::test]
async fn world_runtime_serves_the_transport_envelope() {
    let config = config();
    let world_repo = Arc::new(MemoryWorldRepository::new());
    let world = WorldRuntime::new(world_repo.clone(), config.clone(), DEFAULT_ASK_TIMEOUT);

    let response = world
        .handle(Some(WorldRequest {
            world_id: 1,
            body: Some(WorldMessage::CreateCity(HwCreateCity {
                world_id: 1,
                player_id: 42,
                nick_name: "momo".into(),
            })),
        }))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(WorldRespBody::CreateCity(city)) = response.body else {
        panic!("expected create-city body");
    };
    assert!(city.city_id > 0);

    let response = world
        .handle(Some(WorldRequest {
            world_id: 1,
            body: Some(WorldMessage::MyCities(HwMyCities {
                world_id: 1,
                player_id: 42,
            })),
        }))
        .await
        .unwrap();
    let Some(WorldRespBody::MyCities(cities)) = response.body else {
        panic!("expected my-cities body");
    };
    assert_eq!(cities.len(), 1);

    let response = world
        .handle(Some(WorldRequest {
            world_id: 1,
            body: Some(WorldMessage::WorldMap(HwWorldMap {
                world_id: 1,
                player_id: 42,
            })),
        }))
        .await
        .unwrap();
    let Some(WorldRespBody::WorldMap(cells)) = response.body else {
        panic!("expected world-map body");
    };
    assert_eq!(cells.len(), config.map.cells.len());

    // The first-boot map seed reached durability.
    let doc = world_repo.document(WorldId::from_raw(1).unwrap()).unwrap();
    assert_eq!(doc.world_map.len(), config.map.cells.len());

    world.shutdown().await;
}

#[tokio::test]
async fn pos_tag_list_reads_the_attribute_aggregate() {
    let stack = full_stack();

    let response = stack
        .player
        .handle(request(42, 1, PlayerReqBody::PosTagList(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok);
    let Some(PlayerRespBody::PosTagList(body)) = response.body else {
        panic!("expected pos-tag-list body");
    };
    // Fresh players carry the seeded (empty) marker list.
    assert!(body.pos_tags.is_empty());

    stack.player.shutdown().await;
    stack.world.shutdown().await;
}

#[tokio::test]
async fn document_store_backs_the_full_stack() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let world = WorldRuntime::new(
        Arc::new(stronghold::DocumentWorldRepository::new(dir.path())),
        config.clone(),
        DEFAULT_ASK_TIMEOUT,
    );
    let player = PlayerRuntime::new(
        Arc::new(stronghold::DocumentPlayerRepository::new(dir.path())),
        world.world_recipient(),
        WorldId::from_raw(1).unwrap(),
        config,
        DEFAULT_ASK_TIMEOUT,
    );

    let response = player
        .handle(request(42, 1, PlayerReqBody::EnterServer(Default::default())))
        .await
        .unwrap();
    assert!(response.result.ok, "{:?}", response.result);

    // Both seeds landed as documents.
    assert!(dir.path().join("players").join("42.json").exists());
    assert!(dir.path().join("worlds").join("1.json").exists());

    player.shutdown().await;
    world.shutdown().await;
}

#[tokio::test]
async fn shutdown_flushes_unpersisted_mutations() {
    let stack = full_stack();
    let want = GameConfig::default().general.skill_limit;

    // Seeding generals dirties the entity without a synchronous flush.
    stack
        .player
        .handle(request(42, 1, PlayerReqBody::MyGenerals(Default::default())))
        .await
        .unwrap();

    stack.player.shutdown().await;

    let doc = stack
        .player_repo
        .document(stronghold::PlayerId::from_raw(42).unwrap())
        .unwrap();
    assert_eq!(doc.generals.len(), want);

    stack.world.shutdown().await;
}
