//! Typed request → handler table for the player actor.
//!
//! Registration is per body kind; dispatch unwraps the oneof body, looks the
//! handler up, re-checks the registered kind, and invokes on the actor's
//! mailbox step.

use super::handlers;
use super::PlayerActor;
use crate::actor::runtime::{BoxFuture, Context};
use crate::proto::{reason, PlayerReqBody, PlayerReqKind, PlayerRequest, PlayerResponse};
use std::collections::HashMap;

type HandlerFn = for<'a> fn(
    &'a mut PlayerActor,
    &'a mut Context<PlayerActor>,
    PlayerReqBody,
) -> BoxFuture<'a, ()>;

struct Handler {
    kind: PlayerReqKind,
    run: HandlerFn,
}

pub struct PlayerDispatcher {
    handlers: HashMap<PlayerReqKind, Handler>,
}

impl PlayerDispatcher {
    pub fn new() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
        };
        dispatcher.register(PlayerReqKind::EnterServer, handlers::handle_enter_server);
        dispatcher.register(PlayerReqKind::CreateRole, handlers::handle_create_role);
        dispatcher.register(PlayerReqKind::WorldMap, handlers::handle_world_map);
        dispatcher.register(PlayerReqKind::MyProperty, handlers::handle_my_property);
        dispatcher.register(PlayerReqKind::MyGenerals, handlers::handle_my_generals);
        dispatcher.register(PlayerReqKind::PosTagList, handlers::handle_pos_tag_list);
        dispatcher
    }

    fn register(&mut self, kind: PlayerReqKind, run: HandlerFn) {
        self.handlers.insert(kind, Handler { kind, run });
    }

    pub async fn dispatch(
        &self,
        actor: &mut PlayerActor,
        ctx: &mut Context<PlayerActor>,
        request: PlayerRequest,
    ) {
        let Some(body) = request.body else {
            ctx.respond(PlayerResponse::fail(reason::EMPTY_REQUEST_BODY));
            return;
        };

        let Some(handler) = self.handlers.get(&body.kind()) else {
            ctx.respond(PlayerResponse::fail(reason::NO_HANDLER));
            return;
        };
        if handler.kind != body.kind() {
            ctx.respond(PlayerResponse::fail(reason::BODY_TYPE_MISMATCH));
            return;
        }

        (handler.run)(actor, ctx, body).await;
    }
}

impl Default for PlayerDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
