//! Typed request → handler table for the world actor, keyed by message kind.

use super::handlers;
use super::WorldActor;
use crate::actor::runtime::{BoxFuture, Context};
use crate::proto::{reason, WorldMessage, WorldMsgKind, WorldReply};
use std::collections::HashMap;

type HandlerFn = for<'a> fn(
    &'a mut WorldActor,
    &'a mut Context<WorldActor>,
    WorldMessage,
) -> BoxFuture<'a, ()>;

struct Handler {
    kind: WorldMsgKind,
    run: HandlerFn,
}

pub struct WorldDispatcher {
    handlers: HashMap<WorldMsgKind, Handler>,
}

impl WorldDispatcher {
    pub fn new() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
        };
        dispatcher.register(WorldMsgKind::CreateCity, handlers::handle_create_city);
        dispatcher.register(WorldMsgKind::WorldMap, handlers::handle_world_map);
        dispatcher.register(WorldMsgKind::MyCities, handlers::handle_my_cities);
        dispatcher
    }

    fn register(&mut self, kind: WorldMsgKind, run: HandlerFn) {
        self.handlers.insert(kind, Handler { kind, run });
    }

    pub async fn dispatch(
        &self,
        actor: &mut WorldActor,
        ctx: &mut Context<WorldActor>,
        msg: WorldMessage,
    ) {
        let Some(handler) = self.handlers.get(&msg.kind()) else {
            ctx.respond(WorldReply::fail(reason::NO_HANDLER));
            return;
        };
        if handler.kind != msg.kind() {
            ctx.respond(WorldReply::fail(reason::BODY_TYPE_MISMATCH));
            return;
        }
        (handler.run)(actor, ctx, msg).await;
    }
}

impl Default for WorldDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
