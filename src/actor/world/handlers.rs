//! World-actor request handlers.

use super::{service, WorldActor};
use crate::actor::runtime::{BoxFuture, Context};
use crate::proto::{reason, WorldMessage, WorldReply};
use tracing::debug;

pub(super) fn handle_create_city<'a>(
    actor: &'a mut WorldActor,
    ctx: &'a mut Context<WorldActor>,
    msg: WorldMessage,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let WorldMessage::CreateCity(request) = msg else {
            ctx.respond(WorldReply::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };

        let config = actor.config();
        let Some(world) = actor.dc_mut().entity_mut() else {
            ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
            return;
        };
        let reply = service::create_city(world, &config, &request);
        debug!(
            player_id = request.player_id,
            city_id = reply.city_id,
            "create city handled"
        );
        ctx.respond(WorldReply::CreateCity(reply));
    })
}

pub(super) fn handle_world_map<'a>(
    actor: &'a mut WorldActor,
    ctx: &'a mut Context<WorldActor>,
    msg: WorldMessage,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let WorldMessage::WorldMap(_) = msg else {
            ctx.respond(WorldReply::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };
        let Some(world) = actor.dc().entity() else {
            ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
            return;
        };
        ctx.respond(WorldReply::WorldMap(service::world_map(world)));
    })
}

pub(super) fn handle_my_cities<'a>(
    actor: &'a mut WorldActor,
    ctx: &'a mut Context<WorldActor>,
    msg: WorldMessage,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let WorldMessage::MyCities(request) = msg else {
            ctx.respond(WorldReply::fail(reason::BODY_TYPE_MISMATCH));
            return;
        };
        let Some(world) = actor.dc().entity() else {
            ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
            return;
        };
        ctx.respond(WorldReply::MyCities(service::my_cities(
            world,
            request.player_id,
        )));
    })
}
