//! Manager routing, single-writer serialization, and facade timeout
//! properties.

use std::sync::Arc;
use std::time::Duration;
use stronghold::actor::Recipient;
use stronghold::config::GameConfig;
use stronghold::proto::{
    CreateRoleRequest, PlayerReqBody, PlayerRespBody, PlayerRequest, WhCreateCity, WorldMessage,
    WorldReply,
};
use stronghold::{
    MemoryPlayerRepository, MemoryWorldRepository, PlayerRuntime, TransportCode, WorldId,
    WorldRuntime, DEFAULT_ASK_TIMEOUT,
};
use tokio::time::Instant;

fn request(player_id: i64, seq: i64, body: PlayerReqBody) -> Option<PlayerRequest> {
    Some(PlayerRequest {
        player_id,
        world_id: 1,
        seq,
        body: Some(body),
    })
}

fn stack() -> (PlayerRuntime, WorldRuntime, Arc<MemoryPlayerRepository>) {
    let config = Arc::new(GameConfig::default());
    let world = WorldRuntime::new(
        Arc::new(MemoryWorldRepository::new()),
        config.clone(),
        DEFAULT_ASK_TIMEOUT,
    );
    let repo = Arc::new(MemoryPlayerRepository::new());
    let player = PlayerRuntime::new(
        repo.clone(),
        world.world_recipient(),
        WorldId::from_raw(1).unwrap(),
        config,
        DEFAULT_ASK_TIMEOUT,
    );
    (player, world, repo)
}

#[tokio::test]
async fn one_spawn_per_player_id_even_under_a_request_burst() {
    let (player, world, repo) = stack();
    let player = Arc::new(player);

    let mut tasks = Vec::new();
    for seq in 1..=16 {
        let player = player.clone();
        tasks.push(tokio::spawn(async move {
            player
                .handle(request(42, seq, PlayerReqBody::MyProperty(Default::default())))
                .await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().unwrap().result.ok);
    }

    // One actor, hence exactly one repository load.
    assert_eq!(repo.load_count(), 1);

    match Arc::try_unwrap(player) {
        Ok(player) => player.shutdown().await,
        Err(_) => panic!("player runtime still shared"),
    }
    world.shutdown().await;
}

#[tokio::test]
async fn concurrent_mutations_serialize_to_one_of_the_submitted_states() {
    let (player, world, repo) = stack();
    let player = Arc::new(player);

    let nicks: Vec<String> = (0..16).map(|i| format!("nick-{i}")).collect();
    let mut tasks = Vec::new();
    for (i, nick) in nicks.iter().cloned().enumerate() {
        let player = player.clone();
        tasks.push(tokio::spawn(async move {
            let response = player
                .handle(request(
                    42,
                    (i + 1) as i64,
                    PlayerReqBody::CreateRole(CreateRoleRequest {
                        nick_name: nick.clone(),
                        sex: 0,
                        head_id: 0,
                    }),
                ))
                .await
                .unwrap();
            (nick, response)
        }));
    }

    for task in tasks {
        let (nick, response) = task.await.unwrap();
        assert!(response.result.ok);
        // Each handler observed its own mutation, never a torn mix.
        let Some(PlayerRespBody::CreateRole(body)) = response.body else {
            panic!("expected create-role body");
        };
        assert_eq!(body.role.nick_name, nick);
    }

    let doc = repo
        .document(stronghold::PlayerId::from_raw(42).unwrap())
        .unwrap();
    assert!(nicks.contains(&doc.role.nick_name));

    match Arc::try_unwrap(player) {
        Ok(player) => player.shutdown().await,
        Err(_) => panic!("player runtime still shared"),
    }
    world.shutdown().await;
}

#[tokio::test]
async fn distinct_players_get_distinct_actors() {
    let (player, world, repo) = stack();

    for player_id in 1..=4 {
        let response = player
            .handle(request(
                player_id,
                1,
                PlayerReqBody::MyProperty(Default::default()),
            ))
            .await
            .unwrap();
        assert!(response.result.ok);
    }
    assert_eq!(repo.load_count(), 4);

    player.shutdown().await;
    world.shutdown().await;
}

#[tokio::test]
async fn invalid_ids_fail_at_the_manager() {
    let (player, world, _repo) = stack();

    for bad_id in [0, -3] {
        let response = player
            .handle(request(bad_id, 1, PlayerReqBody::MyProperty(Default::default())))
            .await
            .unwrap();
        assert!(!response.result.ok);
        assert_eq!(response.result.reason, "invalid player_id");
    }

    player.shutdown().await;
    world.shutdown().await;
}

#[tokio::test]
async fn nil_request_is_an_invalid_param_error() {
    let (player, world, _repo) = stack();

    let err = player.handle(None).await.unwrap_err();
    assert_eq!(err.code, TransportCode::InvalidParam);

    player.shutdown().await;
    world.shutdown().await;
}

#[tokio::test]
async fn empty_body_is_a_biz_failure() {
    let (player, world, _repo) = stack();

    let response = player
        .handle(Some(PlayerRequest {
            player_id: 42,
            world_id: 1,
            seq: 1,
            body: None,
        }))
        .await
        .unwrap();
    assert!(!response.result.ok);
    assert_eq!(response.result.reason, "empty request body");

    player.shutdown().await;
    world.shutdown().await;
}

#[tokio::test]
async fn restart_rebuilds_state_on_the_next_request() {
    use stronghold::actor::PlayerActor;
    use stronghold::{ActorSystem, PlayerId};

    let world: Recipient<WorldMessage, WorldReply> = Recipient::from_fn(|msg, _timeout| {
        Box::pin(async move {
            Ok(match msg {
                WorldMessage::CreateCity(_) => WorldReply::CreateCity(WhCreateCity {
                    city_id: 1,
                    x: 0,
                    y: 0,
                }),
                _ => WorldReply::fail("unused"),
            })
        })
    });

    let system = ActorSystem::new();
    let repo = Arc::new(MemoryPlayerRepository::new());
    let actor = system.spawn(PlayerActor::new(
        PlayerId::from_raw(42).unwrap(),
        WorldId::from_raw(1).unwrap(),
        repo.clone(),
        world,
        Arc::new(GameConfig::default()),
    ));

    let response = actor
        .ask(request(42, 1, PlayerReqBody::MyProperty(Default::default())).unwrap(), DEFAULT_ASK_TIMEOUT)
        .await
        .unwrap();
    assert!(response.result.ok);
    assert_eq!(repo.load_count(), 1);

    actor.notify_restart().await;

    // The restarted actor rebuilds on the next request and keeps serving.
    let response = actor
        .ask(request(42, 2, PlayerReqBody::MyProperty(Default::default())).unwrap(), DEFAULT_ASK_TIMEOUT)
        .await
        .unwrap();
    assert!(response.result.ok);
    assert_eq!(repo.load_count(), 2);

    system.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test(start_paused = true)]
async fn caller_deadline_caps_the_ask_timeout() {
    // A world that never answers keeps player init (and thus the request)
    // pending well past any caller deadline.
    let world: Recipient<WorldMessage, WorldReply> = Recipient::from_fn(|_msg, _timeout| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(WorldReply::CreateCity(WhCreateCity::default()))
        })
    });
    let player = PlayerRuntime::new(
        Arc::new(MemoryPlayerRepository::new()),
        world,
        WorldId::from_raw(1).unwrap(),
        Arc::new(GameConfig::default()),
        DEFAULT_ASK_TIMEOUT,
    );

    let started = Instant::now();
    let deadline = started + Duration::from_millis(50);
    let err = player
        .handle_with_deadline(
            request(42, 1, PlayerReqBody::MyProperty(Default::default())),
            Some(deadline),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, TransportCode::SystemError);
    let elapsed = started.elapsed();
    assert!(
        elapsed < Duration::from_millis(500),
        "blocked for {elapsed:?}, expected to honor the 50ms deadline"
    );

    // An already-lapsed deadline degrades to a minimal 1ms attempt.
    let err = player
        .handle_with_deadline(
            request(42, 2, PlayerReqBody::MyProperty(Default::default())),
            Some(Instant::now()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, TransportCode::SystemError);
}
