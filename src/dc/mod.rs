//! Durability coordinator: per-entity write-behind pipeline.
//!
//! Mutations accumulate in the entity's trace; `tick` coalesces them into a
//! versioned snapshot and hands it to a single writer task through a
//! one-deep pending slot (latest version wins). Persisted versions are
//! monotone: a waiter for version V returns as soon as `persisted >= V`, and
//! a failed save retries forever unless a newer snapshot supersedes it.

use crate::core::{GameError, Result};
use crate::entity::{EntitySnap, PersistEntity};
use crate::repo::Repository;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::warn;

const DEFAULT_FLUSH_EVERY: Duration = Duration::from_secs(3);
const SAVE_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Everything the writer and the front half share, under one mutex.
struct Slot<S> {
    pending: Option<S>,
    version: u64,
    persisted: u64,
    closed: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

/// Write-behind durability coordinator for one entity.
pub struct Dc<E: PersistEntity> {
    repo: Arc<dyn Repository<E>>,
    entity: Option<E>,
    flush_every: Duration,
    slot: Arc<Mutex<Slot<E::Snap>>>,
    wake_tx: mpsc::Sender<()>,
    stop_tx: Option<oneshot::Sender<()>>,
    persisted_rx: watch::Receiver<u64>,
    writer: Option<JoinHandle<()>>,
}

impl<E: PersistEntity> Dc<E> {
    pub fn new(repo: Arc<dyn Repository<E>>) -> Self {
        Self::with_flush_every(repo, DEFAULT_FLUSH_EVERY)
    }

    /// Starts the writer task immediately; exactly one writer exists per DC.
    pub fn with_flush_every(repo: Arc<dyn Repository<E>>, flush_every: Duration) -> Self {
        let slot = Arc::new(Mutex::new(Slot {
            pending: None,
            version: 0,
            persisted: 0,
            closed: false,
        }));
        // Capacity-1 wake channel acts as a level flag, not a queue.
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (persisted_tx, persisted_rx) = watch::channel(0u64);

        let writer = tokio::spawn(writer_loop(
            repo.clone(),
            slot.clone(),
            wake_rx,
            wake_tx.clone(),
            stop_rx,
            persisted_tx,
        ));

        Self {
            repo,
            entity: None,
            flush_every,
            slot,
            wake_tx,
            stop_tx: Some(stop_tx),
            persisted_rx,
            writer: Some(writer),
        }
    }

    /// Loads the entity from the repository and takes ownership of it.
    pub async fn load(&mut self, id: E::Id) -> Result<()> {
        let entity = self.repo.load(id).await?;
        self.entity = Some(entity);
        Ok(())
    }

    pub fn entity(&self) -> Option<&E> {
        self.entity.as_ref()
    }

    /// Mutable access for the owning actor; all mutation stays on its mailbox.
    pub fn entity_mut(&mut self) -> Option<&mut E> {
        self.entity.as_mut()
    }

    pub fn flush_every(&self) -> Duration {
        self.flush_every
    }

    pub fn version(&self) -> u64 {
        lock(&self.slot).version
    }

    pub fn persisted(&self) -> u64 {
        lock(&self.slot).persisted
    }

    pub fn is_dirty(&self) -> bool {
        self.entity.as_ref().is_some_and(E::dirty)
    }

    /// Coalesces accumulated mutations into the pending slot.
    ///
    /// Returns the new version, or zero when there was nothing to flush.
    pub fn tick(&mut self) -> u64 {
        let Some(entity) = self.entity.as_mut() else {
            return 0;
        };
        if !entity.dirty() {
            return 0;
        }

        let version = {
            let mut slot = lock(&self.slot);
            slot.version += 1;
            slot.version
        };
        let Some(snap) = entity.build_snapshot(version) else {
            return 0;
        };

        enqueue_latest(&self.slot, &self.wake_tx, snap);
        version
    }

    /// Ticks and then blocks until the generated version is durable.
    pub async fn flush_sync(&mut self, deadline: Duration) -> Result<()> {
        let version = self.tick();
        if version == 0 {
            return Ok(());
        }
        self.wait_persisted(version, deadline).await
    }

    /// Blocks until `persisted >= version`, the writer exits, or the deadline
    /// passes.
    pub async fn wait_persisted(&self, version: u64, deadline: Duration) -> Result<()> {
        let mut rx = self.persisted_rx.clone();
        let result = tokio::time::timeout(deadline, rx.wait_for(|persisted| *persisted >= version))
            .await;
        match result {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(GameError::WriterDone),
            Err(_) => Err(GameError::Timeout(format!(
                "waiting for persisted version {version}"
            ))),
        }
    }

    /// Best-effort final flush, then stops the writer and waits for it to
    /// drain within the deadline. An in-flight save is never cancelled.
    pub async fn close(&mut self, deadline: Duration) -> Result<()> {
        if let Err(err) = self.flush_sync(deadline).await {
            warn!(error = %err, "final flush before close did not complete");
        }

        lock(&self.slot).closed = true;
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        match tokio::time::timeout(deadline, writer).await {
            Ok(_) => Ok(()),
            Err(_) => Err(GameError::Timeout(
                "waiting for durability writer to drain".into(),
            )),
        }
    }
}

/// Replaces the pending snapshot when the incoming version is newer, then
/// raises the wake flag.
fn enqueue_latest<S: EntitySnap>(slot: &Mutex<Slot<S>>, wake_tx: &mpsc::Sender<()>, snap: S) {
    {
        let mut slot = lock(slot);
        if slot.closed {
            return;
        }
        let newer = slot
            .pending
            .as_ref()
            .map_or(true, |pending| pending.version() < snap.version());
        if newer {
            slot.pending = Some(snap);
        }
    }
    let _ = wake_tx.try_send(());
}

/// Puts a failed snapshot back unless a strictly newer version subsumes it.
fn requeue_on_error<S: EntitySnap>(slot: &Mutex<Slot<S>>, wake_tx: &mpsc::Sender<()>, snap: S) {
    {
        let mut slot = lock(slot);
        if slot.closed || slot.version > snap.version() {
            return;
        }
        let newer = slot
            .pending
            .as_ref()
            .map_or(true, |pending| pending.version() < snap.version());
        if newer {
            slot.pending = Some(snap);
        }
    }
    let _ = wake_tx.try_send(());
}

fn mark_persisted<S: EntitySnap>(
    slot: &Mutex<Slot<S>>,
    persisted_tx: &watch::Sender<u64>,
    version: u64,
) {
    let mut slot = lock(slot);
    if version <= slot.persisted {
        return;
    }
    slot.persisted = version;
    persisted_tx.send_if_modified(|current| {
        if version > *current {
            *current = version;
            true
        } else {
            false
        }
    });
}

async fn writer_loop<E: PersistEntity>(
    repo: Arc<dyn Repository<E>>,
    slot: Arc<Mutex<Slot<E::Snap>>>,
    mut wake_rx: mpsc::Receiver<()>,
    wake_tx: mpsc::Sender<()>,
    mut stop_rx: oneshot::Receiver<()>,
    persisted_tx: watch::Sender<u64>,
) {
    loop {
        tokio::select! {
            _ = wake_rx.recv() => {
                consume_pending(repo.as_ref(), &slot, &wake_tx, &persisted_tx).await;
            }
            _ = &mut stop_rx => {
                consume_pending(repo.as_ref(), &slot, &wake_tx, &persisted_tx).await;
                return;
            }
        }
    }
}

async fn consume_pending<E: PersistEntity>(
    repo: &dyn Repository<E>,
    slot: &Mutex<Slot<E::Snap>>,
    wake_tx: &mpsc::Sender<()>,
    persisted_tx: &watch::Sender<u64>,
) {
    loop {
        let snap = lock(slot).pending.take();
        let Some(snap) = snap else {
            return;
        };

        // A newer version has been generated since; its snapshot subsumes
        // this one.
        if lock(slot).version > snap.version() {
            continue;
        }

        match repo.save(&snap).await {
            Ok(()) => mark_persisted(slot, persisted_tx, snap.version()),
            Err(err) => {
                warn!(
                    version = snap.version(),
                    error = %err,
                    "snapshot save failed, retrying"
                );
                requeue_on_error(slot, wake_tx, snap);
                tokio::time::sleep(SAVE_RETRY_BACKOFF).await;
            }
        }
    }
}
