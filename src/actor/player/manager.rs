//! Keyed router for player actors: one child per player id, spawned lazily
//! with the shared repository, config, and world address injected.

use super::PlayerActor;
use crate::actor::runtime::{Actor, ActorRef, Context, Recipient};
use crate::config::GameConfig;
use crate::core::{PlayerId, WorldId};
use crate::entity::PlayerEntity;
use crate::proto::{reason, PlayerRequest, PlayerResponse, WorldMessage, WorldReply};
use crate::repo::Repository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct PlayerManagerActor {
    repo: Arc<dyn Repository<PlayerEntity>>,
    world: Recipient<WorldMessage, WorldReply>,
    world_id: WorldId,
    config: Arc<GameConfig>,
    players: HashMap<PlayerId, ActorRef<PlayerActor>>,
}

impl PlayerManagerActor {
    pub fn new(
        repo: Arc<dyn Repository<PlayerEntity>>,
        world: Recipient<WorldMessage, WorldReply>,
        world_id: WorldId,
        config: Arc<GameConfig>,
    ) -> Self {
        Self {
            repo,
            world,
            world_id,
            config,
            players: HashMap::new(),
        }
    }

    fn get_or_spawn(&mut self, ctx: &Context<Self>, player_id: PlayerId) -> ActorRef<PlayerActor> {
        if let Some(player) = self.players.get(&player_id) {
            return player.clone();
        }
        info!(player_id = %player_id, "spawning player actor");
        let actor = PlayerActor::new(
            player_id,
            self.world_id,
            self.repo.clone(),
            self.world.clone(),
            self.config.clone(),
        );
        let player = ctx.system().spawn(actor);
        self.players.insert(player_id, player.clone());
        player
    }
}

#[async_trait]
impl Actor for PlayerManagerActor {
    type Req = PlayerRequest;
    type Reply = PlayerResponse;

    async fn handle(&mut self, ctx: &mut Context<Self>, request: PlayerRequest) {
        let Some(player_id) = PlayerId::from_raw(request.player_id) else {
            ctx.respond(PlayerResponse::fail(reason::INVALID_PLAYER_ID));
            return;
        };

        // Forward so the eventual reply routes to the original asker.
        let player = self.get_or_spawn(ctx, player_id);
        let replier = ctx.take_replier();
        player.forward(request, replier).await;
    }
}
