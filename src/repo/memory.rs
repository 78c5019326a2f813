//! In-memory stores honoring the repository contracts, with failure-injection
//! knobs the durability test suites drive.

use super::Repository;
use crate::core::{GameError, PlayerId, Result, WorldId};
use crate::entity::{PlayerEntity, PlayerSnap, PlayerState, WorldEntity, WorldSnap, WorldState};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Shared instrumentation: attempt counting, scripted failures, and an
/// optional per-save delay.
#[derive(Debug, Default)]
struct SaveKnobs {
    calls: AtomicU64,
    fail_remaining: AtomicU32,
    delay_ms: AtomicU64,
}

impl SaveKnobs {
    async fn before_save(&self, op: &'static str, entity_id: i64) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let failed = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                (left > 0).then(|| left - 1)
            })
            .is_ok();
        if failed {
            return Err(GameError::infra(
                op,
                entity_id,
                anyhow!("injected save failure"),
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPlayerRepository {
    docs: Mutex<HashMap<PlayerId, PlayerState>>,
    loads: AtomicU64,
    knobs: SaveKnobs,
}

impl MemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> u64 {
        self.knobs.calls.load(Ordering::SeqCst)
    }

    /// The next `n` saves fail with an infra error, then saves succeed again.
    pub fn fail_next_saves(&self, n: u32) {
        self.knobs.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        self.knobs
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Last persisted document, if any.
    pub fn document(&self, id: PlayerId) -> Option<PlayerState> {
        self.docs.lock().ok()?.get(&id).cloned()
    }
}

#[async_trait]
impl Repository<PlayerEntity> for MemoryPlayerRepository {
    async fn load(&self, id: PlayerId) -> Result<PlayerEntity> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let doc = self
            .docs
            .lock()
            .map_err(|err| {
                GameError::infra("repo.player.load", id.value(), anyhow!(err.to_string()))
            })?
            .get(&id)
            .cloned();
        Ok(match doc {
            Some(state) => PlayerEntity::hydrate(id, state),
            None => PlayerEntity::new(id),
        })
    }

    async fn save(&self, snap: &PlayerSnap) -> Result<()> {
        let id = snap.state.player_id;
        self.knobs.before_save("repo.player.save", id).await?;

        let Some(key) = PlayerId::from_raw(id) else {
            return Err(GameError::infra(
                "repo.player.save",
                id,
                anyhow!("snapshot without a player id"),
            ));
        };
        self.docs
            .lock()
            .map_err(|err| GameError::infra("repo.player.save", id, anyhow!(err.to_string())))?
            .insert(key, snap.state.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryWorldRepository {
    docs: Mutex<HashMap<WorldId, WorldState>>,
    knobs: SaveKnobs,
}

impl MemoryWorldRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> u64 {
        self.knobs.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_saves(&self, n: u32) {
        self.knobs.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        self.knobs
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn document(&self, id: WorldId) -> Option<WorldState> {
        self.docs.lock().ok()?.get(&id).cloned()
    }
}

#[async_trait]
impl Repository<WorldEntity> for MemoryWorldRepository {
    async fn load(&self, id: WorldId) -> Result<WorldEntity> {
        let doc = self
            .docs
            .lock()
            .map_err(|err| {
                GameError::infra("repo.world.load", id.value(), anyhow!(err.to_string()))
            })?
            .get(&id)
            .cloned();
        Ok(match doc {
            Some(state) => WorldEntity::hydrate(id, state),
            None => WorldEntity::new(id),
        })
    }

    async fn save(&self, snap: &WorldSnap) -> Result<()> {
        let id = snap.state.world_id;
        self.knobs.before_save("repo.world.save", id).await?;

        let Some(key) = WorldId::from_raw(id) else {
            return Err(GameError::infra(
                "repo.world.save",
                id,
                anyhow!("snapshot without a world id"),
            ));
        };
        self.docs
            .lock()
            .map_err(|err| GameError::infra("repo.world.save", id, anyhow!(err.to_string())))?
            .insert(key, snap.state.clone());
        Ok(())
    }
}
