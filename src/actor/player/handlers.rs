//! Player-actor request handlers.
//!
//! Every handler either responds before returning or schedules a reentrant
//! continuation that responds; peer asks never block the mailbox.

use super::{service, PlayerActor};
use crate::actor::runtime::{BoxFuture, Context};
use crate::actor::{INIT_FLUSH_DEADLINE, PEER_ASK_TIMEOUT};
use crate::entity::RoleState;
use crate::proto::{
    reason, CellView, CreateRoleResponse, HwMyCities, HwWorldMap, PlayerReqBody, PlayerRespBody,
    PlayerResponse, RoleView, WorldMapResponse, WorldMessage, WorldReply,
};
use chrono::Utc;
use tracing::{debug, warn};

pub(super) fn handle_enter_server<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::EnterServer(_) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };
        let Some(player) = actor.entity() else {
            ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            return;
        };
        ctx.respond(PlayerResponse::ok(PlayerRespBody::EnterServer(
            service::build_enter_server(player),
        )));
    })
}

pub(super) fn handle_create_role<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::CreateRole(request) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };

        let role = RoleState {
            head_id: request.head_id,
            sex: request.sex as i8,
            nick_name: request.nick_name,
            created_at: Some(Utc::now()),
            ..RoleState::default()
        };

        let Some(player) = actor.entity_mut() else {
            ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            return;
        };
        player.set_profile(role.clone());

        // The new identity must be durable before the client sees it.
        if let Err(err) = actor.dc_mut().flush_sync(INIT_FLUSH_DEADLINE).await {
            warn!(error = %err, "create role flush failed");
            ctx.respond(PlayerResponse::fail("create role not persisted"));
            return;
        }

        ctx.respond(PlayerResponse::ok(PlayerRespBody::CreateRole(
            CreateRoleResponse {
                role: RoleView {
                    nick_name: role.nick_name,
                    sex: role.sex as i32,
                    balance: role.balance,
                    head_id: role.head_id,
                    profile: role.profile,
                },
            },
        )));
    })
}

pub(super) fn handle_world_map<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::WorldMap(_) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };

        let ask = actor.world().ask(
            WorldMessage::WorldMap(HwWorldMap {
                world_id: actor.world_id().value(),
                player_id: actor.player_id().value(),
            }),
            PEER_ASK_TIMEOUT,
        );

        let replier = ctx.take_replier();
        ctx.reenter_after(ask, move |_actor, _ctx, outcome| match outcome {
            Ok(WorldReply::WorldMap(map)) => {
                replier.send(PlayerResponse::ok(PlayerRespBody::WorldMap(
                    WorldMapResponse {
                        cells: map.cells.iter().map(CellView::from).collect(),
                    },
                )));
            }
            other => {
                debug!(?other, "world map ask failed");
                replier.send(PlayerResponse::fail("world map unavailable"));
            }
        });
    })
}

pub(super) fn handle_my_property<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::MyProperty(_) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };
        let Some(player) = actor.entity() else {
            ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            return;
        };

        let mut response = service::build_my_property(player);
        let ask = actor.world().ask(
            WorldMessage::MyCities(HwMyCities {
                world_id: actor.world_id().value(),
                player_id: actor.player_id().value(),
            }),
            PEER_ASK_TIMEOUT,
        );

        // Degrade to player-local data when the world side cannot answer.
        let replier = ctx.take_replier();
        ctx.reenter_after(ask, move |_actor, _ctx, outcome| {
            if let Ok(WorldReply::MyCities(cities)) = outcome {
                response.cities = service::city_views(&cities.cities);
            }
            replier.send(PlayerResponse::ok(PlayerRespBody::MyProperty(response)));
        });
    })
}

pub(super) fn handle_my_generals<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::MyGenerals(_) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };

        let config = actor.config();
        let Some(player) = actor.entity_mut() else {
            ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            return;
        };
        service::seed_generals(player, &config);

        ctx.respond(PlayerResponse::ok(PlayerRespBody::MyGenerals(
            crate::proto::MyGeneralsResponse {
                generals: service::build_my_generals(player),
            },
        )));
    })
}

pub(super) fn handle_pos_tag_list<'a>(
    actor: &'a mut PlayerActor,
    ctx: &'a mut Context<PlayerActor>,
    body: PlayerReqBody,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let PlayerReqBody::PosTagList(_) = body else {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };
        let Some(player) = actor.entity() else {
            ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            return;
        };
        ctx.respond(PlayerResponse::ok(PlayerRespBody::PosTagList(
            service::build_pos_tag_list(player),
        )));
    })
}
