//! Player entity actor and its keyed manager.

mod dispatcher;
mod handlers;
mod manager;
pub mod service;

pub use manager::PlayerManagerActor;

use super::runtime::{Actor, Context, FlushTicker, Recipient};
use super::seq::SeqWindow;
use super::{
    Lifecycle, CREATE_CITY_TIMEOUT, DC_CLOSE_DEADLINE, INIT_FLUSH_DEADLINE, SEQ_WINDOW_SIZE,
};
use crate::config::GameConfig;
use crate::core::{GameError, PlayerId, Result, WorldId};
use crate::dc::Dc;
use crate::entity::PlayerEntity;
use crate::proto::{reason, HwCreateCity, PlayerRequest, PlayerResponse, WorldMessage, WorldReply};
use crate::repo::Repository;
use async_trait::async_trait;
use dispatcher::PlayerDispatcher;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Single writer around one player entity.
///
/// The world peer is addressed logically through a `Recipient`, resolved at
/// construction by the manager; there is no back-pointer from world to
/// player.
pub struct PlayerActor {
    state: Lifecycle,
    player_id: PlayerId,
    world_id: WorldId,
    dc: Dc<PlayerEntity>,
    world: Recipient<WorldMessage, WorldReply>,
    config: Arc<GameConfig>,
    dispatcher: Arc<PlayerDispatcher>,
    seq_window: SeqWindow,
    ticker: Option<FlushTicker>,
}

impl PlayerActor {
    pub fn new(
        player_id: PlayerId,
        world_id: WorldId,
        repo: Arc<dyn Repository<PlayerEntity>>,
        world: Recipient<WorldMessage, WorldReply>,
        config: Arc<GameConfig>,
    ) -> Self {
        Self {
            state: Lifecycle::None,
            player_id,
            world_id,
            dc: Dc::new(repo),
            world,
            config,
            dispatcher: Arc::new(PlayerDispatcher::new()),
            seq_window: SeqWindow::new(SEQ_WINDOW_SIZE),
            ticker: None,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    pub(super) fn entity(&self) -> Option<&PlayerEntity> {
        self.dc.entity()
    }

    pub(super) fn entity_mut(&mut self) -> Option<&mut PlayerEntity> {
        self.dc.entity_mut()
    }

    pub(super) fn dc_mut(&mut self) -> &mut Dc<PlayerEntity> {
        &mut self.dc
    }

    pub(super) fn world(&self) -> Recipient<WorldMessage, WorldReply> {
        self.world.clone()
    }

    pub(super) fn config(&self) -> Arc<GameConfig> {
        self.config.clone()
    }

    /// Loads the player, seeds first-login defaults, makes the seed durable,
    /// and bootstraps the starting city on the world side. Only a fully
    /// bootstrapped player turns `Online`.
    async fn init(&mut self, ctx: &mut Context<Self>, respond_on_err: bool) -> Result<()> {
        if self.state == Lifecycle::Init {
            if respond_on_err {
                ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            }
            return Ok(());
        }
        self.state = Lifecycle::Init;

        if let Err(err) = self.dc.load(self.player_id).await {
            error!(player_id = %self.player_id, error = %err, "player load failed");
            self.state = Lifecycle::LoadFailed;
            if respond_on_err {
                ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
            }
            return Err(err);
        }

        let mut seeded = false;
        if let Some(player) = self.dc.entity_mut() {
            seeded = service::ensure_initial_state(player, &self.config);
        }
        if seeded {
            if let Err(err) = self.dc.flush_sync(INIT_FLUSH_DEADLINE).await {
                warn!(player_id = %self.player_id, error = %err, "initial-state flush incomplete");
            }
        }

        let nick_name = self
            .entity()
            .and_then(|p| p.profile())
            .map(|profile| profile.nick_name().to_string())
            .unwrap_or_else(|| service::DEFAULT_NICK_NAME.to_string());

        let bootstrap = self
            .world
            .ask(
                WorldMessage::CreateCity(HwCreateCity {
                    world_id: self.world_id.value(),
                    player_id: self.player_id.value(),
                    nick_name,
                }),
                CREATE_CITY_TIMEOUT,
            )
            .await;

        match bootstrap {
            Ok(WorldReply::CreateCity(city)) => {
                info!(
                    player_id = %self.player_id,
                    city_id = city.city_id,
                    x = city.x,
                    y = city.y,
                    "starting city ready"
                );
            }
            other => {
                warn!(player_id = %self.player_id, ?other, "create-city bootstrap failed");
                self.state = Lifecycle::LoadFailed;
                if respond_on_err {
                    ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
                }
                return Err(GameError::CreateCity);
            }
        }

        self.state = Lifecycle::Online;
        if self.ticker.is_none() {
            self.ticker = Some(FlushTicker::start(&ctx.self_ref(), self.dc.flush_every()));
        }
        info!(player_id = %self.player_id, seeded, "player online");
        Ok(())
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

#[async_trait]
impl Actor for PlayerActor {
    type Req = PlayerRequest;
    type Reply = PlayerResponse;

    async fn started(&mut self, ctx: &mut Context<Self>) {
        let _ = self.init(ctx, false).await;
    }

    async fn stopping(&mut self, _ctx: &mut Context<Self>) {
        self.stop_ticker();
        if let Err(err) = self.dc.close(DC_CLOSE_DEADLINE).await {
            error!(player_id = %self.player_id, error = %err, "player dc close failed");
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

    async fn handle(&mut self, ctx: &mut Context<Self>, request: PlayerRequest) {
        // Seq gate first: a replayed or malformed request never touches state.
        if request.seq <= 0 {
            ctx.respond(PlayerResponse::fail(reason::INVALID_SEQ));
            return;
        }
        if !self.seq_window.accept(request.seq) {
            ctx.respond(PlayerResponse::fail(reason::DUPLICATE_SEQ));
            return;
        }

        if self.state != Lifecycle::Online {
            let _ = self.init(ctx, true).await;
            if self.state != Lifecycle::Online {
                ctx.respond(PlayerResponse::fail(reason::PLAYER_LOADING));
                return;
            }
        }

        let dispatcher = self.dispatcher.clone();
        dispatcher.dispatch(self, ctx, request).await;
    }
}
