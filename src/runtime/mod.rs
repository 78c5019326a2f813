//! Per-service runtime facades.
//!
//! Each facade owns an actor system with the service's manager at the root
//! and converts synchronous RPC-style calls into timed asks. The per-call
//! timeout is the smaller of the configured ask-timeout and whatever remains
//! of the caller's deadline.

use crate::actor::{
    ActorRef, ActorSystem, AskError, PlayerManagerActor, Recipient, WorldManagerActor,
};
use crate::config::GameConfig;
use crate::core::WorldId;
use crate::entity::{PlayerEntity, WorldEntity};
use crate::proto::{
    reason, CellView, CityView, PlayerRequest, PlayerResponse, WorldMessage, WorldReply,
    WorldRequest, WorldRespBody, WorldResponse,
};
use crate::repo::Repository;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(3);
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Transport-level outcome codes the boundary adapter maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    Ok,
    InvalidParam,
    SystemError,
}

/// Error surfaced to the transport layer; business rejections never take this
/// path, they ride the response envelope.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RuntimeError {
    pub code: TransportCode,
    pub message: String,
    #[source]
    pub cause: Option<AskError>,
}

impl RuntimeError {
    fn invalid_param(message: impl Into<String>) -> Self {
        Self {
            code: TransportCode::InvalidParam,
            message: message.into(),
            cause: None,
        }
    }

    fn system(message: impl Into<String>, cause: AskError) -> Self {
        Self {
            code: TransportCode::SystemError,
            message: message.into(),
            cause: Some(cause),
        }
    }
}

fn effective_timeout(default: Duration, deadline: Option<Instant>) -> Duration {
    let Some(deadline) = deadline else {
        return default;
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        // An already-expired deadline still gets one minimal attempt so the
        // caller observes a timeout rather than a hang.
        return Duration::from_millis(1);
    }
    remaining.min(default)
}

/// Facade of the player service.
pub struct PlayerRuntime {
    system: ActorSystem,
    manager: ActorRef<PlayerManagerActor>,
    timeout: Duration,
}

impl PlayerRuntime {
    /// Spawns the actor system and the root player manager.
    ///
    /// `world` is the logical address of the peer world service; tests pass a
    /// fake recipient.
    pub fn new(
        repo: Arc<dyn Repository<PlayerEntity>>,
        world: Recipient<WorldMessage, WorldReply>,
        world_id: WorldId,
        config: Arc<GameConfig>,
        ask_timeout: Duration,
    ) -> Self {
        let timeout = if ask_timeout.is_zero() {
            DEFAULT_ASK_TIMEOUT
        } else {
            ask_timeout
        };
        let system = ActorSystem::new();
        let manager = system.spawn(PlayerManagerActor::new(repo, world, world_id, config));
        Self {
            system,
            manager,
            timeout,
        }
    }

    pub async fn handle(
        &self,
        request: Option<PlayerRequest>,
    ) -> Result<PlayerResponse, RuntimeError> {
        self.handle_with_deadline(request, None).await
    }

    /// `deadline` is the caller's absolute deadline; a lapsed one yields a
    /// near-immediate SystemError instead of blocking for the full timeout.
    pub async fn handle_with_deadline(
        &self,
        request: Option<PlayerRequest>,
        deadline: Option<Instant>,
    ) -> Result<PlayerResponse, RuntimeError> {
        let Some(request) = request else {
            return Err(RuntimeError::invalid_param(reason::NIL_REQUEST));
        };

        let timeout = effective_timeout(self.timeout, deadline);
        self.manager
            .ask(request, timeout)
            .await
            .map_err(|err| RuntimeError::system("player manager ask failed", err))
    }

    pub async fn shutdown(self) {
        self.manager.stop().await;
        self.system.shutdown(SHUTDOWN_DEADLINE).await;
    }
}

/// Facade of the world service.
pub struct WorldRuntime {
    system: ActorSystem,
    manager: ActorRef<WorldManagerActor>,
    timeout: Duration,
}

impl WorldRuntime {
    pub fn new(
        repo: Arc<dyn Repository<WorldEntity>>,
        config: Arc<GameConfig>,
        ask_timeout: Duration,
    ) -> Self {
        let timeout = if ask_timeout.is_zero() {
            DEFAULT_ASK_TIMEOUT
        } else {
            ask_timeout
        };
        let system = ActorSystem::new();
        let manager = system.spawn(WorldManagerActor::new(repo, config));
        Self {
            system,
            manager,
            timeout,
        }
    }

    /// Logical address player services (and tests) use to reach this world.
    pub fn world_recipient(&self) -> Recipient<WorldMessage, WorldReply> {
        self.manager.recipient()
    }

    pub async fn handle(
        &self,
        request: Option<WorldRequest>,
    ) -> Result<WorldResponse, RuntimeError> {
        self.handle_with_deadline(request, None).await
    }

    pub async fn handle_with_deadline(
        &self,
        request: Option<WorldRequest>,
        deadline: Option<Instant>,
    ) -> Result<WorldResponse, RuntimeError> {
        let Some(request) = request else {
            return Err(RuntimeError::invalid_param(reason::NIL_REQUEST));
        };
        let Some(body) = request.body else {
            return Ok(WorldResponse::fail(reason::EMPTY_REQUEST_BODY));
        };

        let timeout = effective_timeout(self.timeout, deadline);
        let reply = self
            .manager
            .ask(body, timeout)
            .await
            .map_err(|err| RuntimeError::system("world manager ask failed", err))?;

        Ok(match reply {
            WorldReply::CreateCity(city) => WorldResponse::ok(WorldRespBody::CreateCity(city)),
            WorldReply::WorldMap(map) => WorldResponse::ok(WorldRespBody::WorldMap(
                map.cells.iter().map(CellView::from).collect(),
            )),
            WorldReply::MyCities(cities) => WorldResponse::ok(WorldRespBody::MyCities(
                cities.cities.iter().map(CityView::from).collect(),
            )),
            WorldReply::Fail { reason } => WorldResponse::fail(reason),
        })
    }

    pub async fn shutdown(self) {
        self.manager.stop().await;
        self.system.shutdown(SHUTDOWN_DEADLINE).await;
    }
}
