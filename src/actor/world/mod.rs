//! World entity actor and its keyed manager.

mod dispatcher;
mod handlers;
mod manager;
pub mod service;

pub use manager::WorldManagerActor;

use super::runtime::{Actor, Context, FlushTicker};
use super::{Lifecycle, DC_CLOSE_DEADLINE, INIT_FLUSH_DEADLINE};
use crate::config::GameConfig;
use crate::core::{Result, WorldId};
use crate::dc::Dc;
use crate::entity::WorldEntity;
use crate::proto::{reason, WorldMessage, WorldReply};
use crate::repo::Repository;
use async_trait::async_trait;
use dispatcher::WorldDispatcher;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Single writer around one world entity: owns the tile grid and every
/// player's city holdings in its world.
pub struct WorldActor {
    state: Lifecycle,
    world_id: WorldId,
    dc: Dc<WorldEntity>,
    config: Arc<GameConfig>,
    dispatcher: Arc<WorldDispatcher>,
    ticker: Option<FlushTicker>,
}

impl WorldActor {
    pub fn new(
        world_id: WorldId,
        repo: Arc<dyn Repository<WorldEntity>>,
        config: Arc<GameConfig>,
    ) -> Self {
        Self {
            state: Lifecycle::None,
            world_id,
            dc: Dc::new(repo),
            config,
            dispatcher: Arc::new(WorldDispatcher::new()),
            ticker: None,
        }
    }

    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    pub(super) fn dc(&self) -> &Dc<WorldEntity> {
        &self.dc
    }

    pub(super) fn dc_mut(&mut self) -> &mut Dc<WorldEntity> {
        &mut self.dc
    }

    pub(super) fn config(&self) -> Arc<GameConfig> {
        self.config.clone()
    }

    /// Loads the world and seeds the tile grid on first boot. Leaves the
    /// actor `Online` only when the seed is durable.
    async fn init(&mut self, ctx: &mut Context<Self>, respond_on_err: bool) -> Result<()> {
        if self.state == Lifecycle::Init {
            if respond_on_err {
                ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
            }
            return Ok(());
        }
        self.state = Lifecycle::Init;

        if let Err(err) = self.dc.load(self.world_id).await {
            error!(world_id = %self.world_id, error = %err, "world load failed");
            self.state = Lifecycle::LoadFailed;
            if respond_on_err {
                ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
            }
            return Err(err);
        }

        let mut seeded = false;
        if let Some(world) = self.dc.entity_mut() {
            if world.len_world_map() == 0 {
                seeded = world.replace_world_map(service::seed_world_map(&self.config));
            }
        }
        if seeded {
            if let Err(err) = self.dc.flush_sync(INIT_FLUSH_DEADLINE).await {
                warn!(world_id = %self.world_id, error = %err, "world seed flush incomplete");
            }
        }

        self.state = Lifecycle::Online;
        if self.ticker.is_none() {
            self.ticker = Some(FlushTicker::start(&ctx.self_ref(), self.dc.flush_every()));
        }
        info!(world_id = %self.world_id, seeded, "world online");
        Ok(())
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[async_trait]
impl Actor for WorldActor {
    type Req = WorldMessage;
    type Reply = WorldReply;

    async fn started(&mut self, ctx: &mut Context<Self>) {
        let _ = self.init(ctx, false).await;
    }

    async fn stopping(&mut self, _ctx: &mut Context<Self>) {
        self.stop_ticker();
        if let Err(err) = self.dc.close(DC_CLOSE_DEADLINE).await {
            error!(world_id = %self.world_id, error = %err, "world dc close failed");
        }
        self.state = Lifecycle::Stopping;
    }

    async fn stopped(&mut self, _ctx: &mut Context<Self>) {
        self.stop_ticker();
        self.state = Lifecycle::Offline;
    }

    async fn restarting(&mut self, _ctx: &mut Context<Self>) {
        // State is rebuilt by the next inbound request.
        self.stop_ticker();
        self.state = Lifecycle::None;
    }

    async fn flush_tick(&mut self, _ctx: &mut Context<Self>) {
        if self.state != Lifecycle::Online {
            return;
        }
        self.dc.tick();
    }

    async fn handle(&mut self, ctx: &mut Context<Self>, msg: WorldMessage) {
        if self.state != Lifecycle::Online {
            let _ = self.init(ctx, true).await;
            if self.state != Lifecycle::Online {
                ctx.respond(WorldReply::fail(reason::WORLD_NOT_ONLINE));
                return;
            }
        }

        let dispatcher = self.dispatcher.clone();
        dispatcher.dispatch(self, ctx, msg).await;
    }
}
