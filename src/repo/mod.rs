//! Repository ports and their two store implementations.
//!
//! Load-by-id and save-snapshot; a missing document is not an error but a
//! freshly constructed entity carrying its id, and saves are whole-document
//! upserts idempotent per version.

mod document;
mod memory;

pub use document::{DocumentPlayerRepository, DocumentWorldRepository};
pub use memory::{MemoryPlayerRepository, MemoryWorldRepository};

use crate::core::Result;
use crate::entity::PersistEntity;
use async_trait::async_trait;

/// Load/save contract the durability coordinator is written against.
#[async_trait]
pub trait Repository<E: PersistEntity>: Send + Sync {
    /// Loads the entity; "not found" yields a fresh entity pre-set with the
    /// id, transport failure an `Infra` error carrying op name and id.
    async fn load(&self, id: E::Id) -> Result<E>;

    /// Upserts the whole document keyed by the snapshot's entity id.
    async fn save(&self, snap: &E::Snap) -> Result<()>;
}
