//! JSON-document stores: one file per entity, written atomically via a tmp
//! file and rename so a crashed save never leaves a torn document.

use super::Repository;
use crate::core::{GameError, PlayerId, Result, WorldId};
use crate::entity::{PlayerEntity, PlayerSnap, WorldEntity, WorldSnap};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

async fn read_doc<T: DeserializeOwned>(
    path: &Path,
    op: &'static str,
    entity_id: i64,
) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(GameError::infra(op, entity_id, anyhow!(err))),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| GameError::infra(op, entity_id, anyhow!(err)))
}

async fn write_doc_atomic<T: Serialize>(
    path: &Path,
    doc: &T,
    op: &'static str,
    entity_id: i64,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|err| GameError::infra(op, entity_id, anyhow!(err)))?;
    }

    let json = serde_json::to_vec_pretty(doc)
        .map_err(|err| GameError::infra(op, entity_id, anyhow!(err)))?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)
        .await
        .map_err(|err| GameError::infra(op, entity_id, anyhow!(err)))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|err| GameError::infra(op, entity_id, anyhow!(err)))?;
    Ok(())
}

/// Player documents under `<root>/players/<id>.json`.
pub struct DocumentPlayerRepository {
    root: PathBuf,
}

impl DocumentPlayerRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn doc_path(&self, id: i64) -> PathBuf {
        self.root.join("players").join(format!("{id}.json"))
    }
}

#[async_trait]
impl Repository<PlayerEntity> for DocumentPlayerRepository {
    async fn load(&self, id: PlayerId) -> Result<PlayerEntity> {
        let doc = read_doc(&self.doc_path(id.value()), "repo.player.load", id.value()).await?;
        Ok(match doc {
            Some(state) => PlayerEntity::hydrate(id, state),
            None => PlayerEntity::new(id),
        })
    }

    async fn save(&self, snap: &PlayerSnap) -> Result<()> {
        let id = snap.state.player_id;
        if id <= 0 {
            return Err(GameError::infra(
                "repo.player.save",
                id,
                anyhow!("snapshot without a player id"),
            ));
        }
        write_doc_atomic(&self.doc_path(id), &snap.state, "repo.player.save", id).await
    }
}

/// World documents under `<root>/worlds/<id>.json`.
pub struct DocumentWorldRepository {
    root: PathBuf,
}

impl DocumentWorldRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn doc_path(&self, id: i64) -> PathBuf {
        self.root.join("worlds").join(format!("{id}.json"))
    }
}

#[async_trait]
impl Repository<WorldEntity> for DocumentWorldRepository {
    async fn load(&self, id: WorldId) -> Result<WorldEntity> {
        let doc = read_doc(&self.doc_path(id.value()), "repo.world.load", id.value()).await?;
        Ok(match doc {
            Some(state) => WorldEntity::hydrate(id, state),
            None => WorldEntity::new(id),
        })
    }

    async fn save(&self, snap: &WorldSnap) -> Result<()> {
        let id = snap.state.world_id;
        if id <= 0 {
            return Err(GameError::infra(
                "repo.world.save",
                id,
                anyhow!("snapshot without a world id"),
            ));
        }
        write_doc_atomic(&self.doc_path(id), &snap.state, "repo.world.save", id).await
    }
}
