//! Keyed router for world actors: one child per world id, spawned lazily.

use super::WorldActor;
use crate::actor::runtime::{Actor, ActorRef, Context};
use crate::config::GameConfig;
use crate::core::WorldId;
use crate::entity::WorldEntity;
use crate::proto::{reason, WorldMessage, WorldReply};
use crate::repo::Repository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct WorldManagerActor {
    repo: Arc<dyn Repository<WorldEntity>>,
    config: Arc<GameConfig>,
    worlds: HashMap<WorldId, ActorRef<WorldActor>>,
}

impl WorldManagerActor {
    pub fn new(repo: Arc<dyn Repository<WorldEntity>>, config: Arc<GameConfig>) -> Self {
        Self {
            repo,
            config,
            worlds: HashMap::new(),
        }
    }

    fn get_or_spawn(&mut self, ctx: &Context<Self>, world_id: WorldId) -> ActorRef<WorldActor> {
        if let Some(world) = self.worlds.get(&world_id) {
            return world.clone();
        }
        info!(world_id = %world_id, "spawning world actor");
        let actor = WorldActor::new(world_id, self.repo.clone(), self.config.clone());
        let world = ctx.system().spawn(actor);
        self.worlds.insert(world_id, world.clone());
        world
    }
}

#[async_trait]
impl Actor for WorldManagerActor {
    type Req = WorldMessage;
    type Reply = WorldReply;

    async fn handle(&mut self, ctx: &mut Context<Self>, msg: WorldMessage) {
        let Some(world_id) = WorldId::from_raw(msg.world_id()) else {
            ctx.respond(WorldReply::fail(reason::INVALID_WORLD_ID));
            return;
        };

        let world = self.get_or_spawn(ctx, world_id);
        let replier = ctx.take_replier();
        world.forward(msg, replier).await;
    }
}
