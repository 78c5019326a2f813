//! Minimal mailbox actor runtime.
//!
//! One tokio task per actor processes envelopes in strict arrival order, so
//! every handler invocation for a given actor is totally ordered and never
//! concurrent. Asks pair a request with a one-shot replier and a timeout;
//! reentrant continuations are posted back to the owning mailbox as `Resume`
//! envelopes, which keeps the single-writer guarantee intact.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

const MAILBOX_CAPACITY: usize = 256;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Unit of single-threaded state plus a mailbox.
#[async_trait]
pub trait Actor: Send + Sized + 'static {
    type Req: Send + 'static;
    type Reply: Send + 'static;

    /// Synthesized by the runtime right after spawn, before any envelope.
    async fn started(&mut self, _ctx: &mut Context<Self>) {}
    /// Last chance to release resources; the mailbox drains no further
    /// requests afterwards.
    async fn stopping(&mut self, _ctx: &mut Context<Self>) {}
    async fn stopped(&mut self, _ctx: &mut Context<Self>) {}
    /// Supervision hook: state should fall back to a pre-online phase.
    async fn restarting(&mut self, _ctx: &mut Context<Self>) {}
    /// Periodic flush sentinel; must not count as user traffic.
    async fn flush_tick(&mut self, _ctx: &mut Context<Self>) {}

    async fn handle(&mut self, ctx: &mut Context<Self>, req: Self::Req);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AskError {
    #[error("ask timed out")]
    Timeout,
    #[error("mailbox closed")]
    MailboxClosed,
    #[error("actor dropped the request without replying")]
    NoReply,
}

/// One-shot reply slot; replying twice is a silent no-op.
pub struct Replier<R> {
    tx: Option<oneshot::Sender<R>>,
}

impl<R> Replier<R> {
    pub fn noop() -> Self {
        Self { tx: None }
    }

    fn from_sender(tx: oneshot::Sender<R>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn send(mut self, reply: R) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(reply);
        }
    }
}

pub(crate) enum Envelope<A: Actor> {
    Request {
        req: A::Req,
        replier: Replier<A::Reply>,
    },
    Resume(Box<dyn FnOnce(&mut A, &mut Context<A>) + Send>),
    FlushTick,
    Restarting,
    Stopping,
}

/// Cheap handle to an actor's mailbox.
pub struct ActorRef<A: Actor> {
    tx: mpsc::Sender<Envelope<A>>,
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Actor> ActorRef<A> {
    /// Fire-and-forget send; the reply slot stays empty.
    pub async fn tell(&self, req: A::Req) {
        let _ = self
            .tx
            .send(Envelope::Request {
                req,
                replier: Replier::noop(),
            })
            .await;
    }

    /// Request with a single typed reply and a timeout.
    pub async fn ask(&self, req: A::Req, timeout: Duration) -> Result<A::Reply, AskError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Envelope::Request {
                req,
                replier: Replier::from_sender(tx),
            })
            .await
            .map_err(|_| AskError::MailboxClosed)?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(AskError::NoReply),
            Err(_) => Err(AskError::Timeout),
        }
    }

    /// Passes a request on so the eventual reply reaches the original asker,
    /// not the forwarding actor.
    pub async fn forward(&self, req: A::Req, replier: Replier<A::Reply>) {
        let _ = self.tx.send(Envelope::Request { req, replier }).await;
    }

    pub async fn stop(&self) {
        let _ = self.tx.send(Envelope::Stopping).await;
    }

    /// Signals a supervision restart; the actor resets to its init phase.
    pub async fn notify_restart(&self) {
        let _ = self.tx.send(Envelope::Restarting).await;
    }

    pub(crate) async fn send_flush_tick(&self) -> Result<(), ()> {
        self.tx.send(Envelope::FlushTick).await.map_err(|_| ())
    }

    pub(crate) async fn send_resume(
        &self,
        resume: Box<dyn FnOnce(&mut A, &mut Context<A>) + Send>,
    ) {
        let _ = self.tx.send(Envelope::Resume(resume)).await;
    }

    /// Type-erased peer address: only the request/reply pair remains visible,
    /// so fakes and differently-typed routers are interchangeable.
    pub fn recipient(&self) -> Recipient<A::Req, A::Reply> {
        let this = self.clone();
        Recipient::from_fn(move |req, timeout| {
            let target = this.clone();
            Box::pin(async move { target.ask(req, timeout).await })
        })
    }
}

type AskFn<Req, Reply> =
    Arc<dyn Fn(Req, Duration) -> BoxFuture<'static, Result<Reply, AskError>> + Send + Sync>;

/// Logical peer address resolved at first use; also the seam test fakes
/// implement.
pub struct Recipient<Req, Reply> {
    ask_fn: AskFn<Req, Reply>,
}

impl<Req, Reply> Clone for Recipient<Req, Reply> {
    fn clone(&self) -> Self {
        Self {
            ask_fn: self.ask_fn.clone(),
        }
    }
}

impl<Req: Send + 'static, Reply: Send + 'static> Recipient<Req, Reply> {
    pub fn from_fn(
        f: impl Fn(Req, Duration) -> BoxFuture<'static, Result<Reply, AskError>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self { ask_fn: Arc::new(f) }
    }

    /// The timeout is enforced here, so every peer ask is bounded no matter
    /// how the backing address behaves.
    pub fn ask(&self, req: Req, timeout: Duration) -> BoxFuture<'static, Result<Reply, AskError>> {
        let fut = (self.ask_fn)(req, timeout);
        Box::pin(async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AskError::Timeout),
            }
        })
    }
}

/// Per-invocation view an actor gets of its runtime.
pub struct Context<A: Actor> {
    self_ref: ActorRef<A>,
    system: ActorSystem,
    replier: Option<Replier<A::Reply>>,
    stop_requested: bool,
}

impl<A: Actor> Context<A> {
    pub fn respond(&mut self, reply: A::Reply) {
        if let Some(replier) = self.replier.take() {
            replier.send(reply);
        }
    }

    /// Moves the reply slot out, e.g. into a continuation or a forward.
    pub fn take_replier(&mut self) -> Replier<A::Reply> {
        self.replier.take().unwrap_or_else(Replier::noop)
    }

    pub fn self_ref(&self) -> ActorRef<A> {
        self.self_ref.clone()
    }

    pub fn system(&self) -> &ActorSystem {
        &self.system
    }

    pub fn stop_self(&mut self) {
        self.stop_requested = true;
    }

    /// Schedules `cont` to run on this actor's own mailbox once the future
    /// resolves. The handler returns immediately; the continuation is a
    /// later, fully serialized mailbox step.
    pub fn reenter_after<T, Fut, F>(&mut self, fut: Fut, cont: F)
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        F: FnOnce(&mut A, &mut Context<A>, T) + Send + 'static,
    {
        let self_ref = self.self_ref.clone();
        tokio::spawn(async move {
            let out = fut.await;
            self_ref
                .send_resume(Box::new(move |actor, ctx| cont(actor, ctx, out)))
                .await;
        });
    }
}

/// Periodic flush-tick pump for one actor; stops on signal or abort-on-drop.
pub struct FlushTicker {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushTicker {
    pub fn start<A: Actor>(target: &ActorRef<A>, every: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let target = target.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick of a tokio interval fires immediately; skip it so
            // the cadence starts one period from now.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if target.send_flush_tick().await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for FlushTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct SpawnedActor {
    stop: Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SystemInner {
    actors: Mutex<Vec<SpawnedActor>>,
}

/// Owns every spawned mailbox task; `shutdown` stops them latest-first.
#[derive(Clone, Default)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

impl ActorSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<A: Actor>(&self, actor: A) -> ActorRef<A> {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let actor_ref = ActorRef { tx };
        let mailbox_ref = actor_ref.clone();
        let system = self.clone();

        let handle = tokio::spawn(run_mailbox(actor, rx, mailbox_ref, system));

        let stop_ref = actor_ref.clone();
        let record = SpawnedActor {
            stop: Box::new(move || {
                let target = stop_ref.clone();
                Box::pin(async move { target.stop().await })
            }),
            handle,
        };
        if let Ok(mut actors) = self.inner.actors.lock() {
            actors.push(record);
        }
        actor_ref
    }

    /// Stops every actor in reverse spawn order (children before the managers
    /// that spawned them) and waits out each mailbox within the deadline.
    pub async fn shutdown(&self, deadline: Duration) {
        let records: Vec<SpawnedActor> = match self.inner.actors.lock() {
            Ok(mut actors) => actors.drain(..).collect(),
            Err(_) => return,
        };

        for record in records.into_iter().rev() {
            (record.stop)().await;
            if tokio::time::timeout(deadline, record.handle).await.is_err() {
                debug!("actor did not drain within shutdown deadline");
            }
        }
    }
}

async fn run_mailbox<A: Actor>(
    mut actor: A,
    mut rx: mpsc::Receiver<Envelope<A>>,
    self_ref: ActorRef<A>,
    system: ActorSystem,
) {
    let mut ctx = Context {
        self_ref,
        system,
        replier: None,
        stop_requested: false,
    };

    actor.started(&mut ctx).await;

    while !ctx.stop_requested {
        let Some(envelope) = rx.recv().await else {
            break;
        };
        match envelope {
            Envelope::Request { req, replier } => {
                ctx.replier = Some(replier);
                actor.handle(&mut ctx, req).await;
                ctx.replier = None;
            }
            Envelope::Resume(resume) => resume(&mut actor, &mut ctx),
            Envelope::FlushTick => actor.flush_tick(&mut ctx).await,
            Envelope::Restarting => actor.restarting(&mut ctx).await,
            Envelope::Stopping => break,
        }
    }

    // Close the mailbox before the stopping hook so late senders see a dead
    // ref rather than a silently dropped message.
    rx.close();
    actor.stopping(&mut ctx).await;
    actor.stopped(&mut ctx).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        count: i64,
        stopped: Option<oneshot::Sender<i64>>,
    }

    #[async_trait]
    impl Actor for Counter {
        type Req = i64;
        type Reply = i64;

        async fn handle(&mut self, ctx: &mut Context<Self>, req: i64) {
            self.count += req;
            ctx.respond(self.count);
        }

        async fn stopped(&mut self, _ctx: &mut Context<Self>) {
            if let Some(tx) = self.stopped.take() {
                let _ = tx.send(self.count);
            }
        }
    }

    #[tokio::test]
    async fn asks_are_processed_in_order() {
        let system = ActorSystem::new();
        let actor = system.spawn(Counter {
            count: 0,
            stopped: None,
        });

        for expected in 1..=5 {
            let total = actor.ask(1, Duration::from_secs(1)).await.unwrap();
            assert_eq!(total, expected);
        }
    }

    #[tokio::test]
    async fn shutdown_runs_lifecycle_hooks() {
        let (tx, rx) = oneshot::channel();
        let system = ActorSystem::new();
        let actor = system.spawn(Counter {
            count: 0,
            stopped: Some(tx),
        });
        actor.ask(7, Duration::from_secs(1)).await.unwrap();

        system.shutdown(Duration::from_secs(1)).await;
        assert_eq!(rx.await.unwrap(), 7);

        let err = actor.ask(1, Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, AskError::MailboxClosed | AskError::Timeout));
    }

    #[tokio::test]
    async fn recipient_erases_the_actor_type() {
        let system = ActorSystem::new();
        let actor = system.spawn(Counter {
            count: 10,
            stopped: None,
        });
        let peer: Recipient<i64, i64> = actor.recipient();
        assert_eq!(peer.ask(5, Duration::from_secs(1)).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn reentrant_continuation_runs_on_the_own_mailbox() {
        struct Echo;

        #[async_trait]
        impl Actor for Echo {
            type Req = ();
            type Reply = i64;

            async fn handle(&mut self, ctx: &mut Context<Self>, _req: ()) {
                let replier = ctx.take_replier();
                ctx.reenter_after(async { 41 }, move |_actor, _ctx, out| {
                    replier.send(out + 1);
                });
            }
        }

        let system = ActorSystem::new();
        let actor = system.spawn(Echo);
        assert_eq!(actor.ask((), Duration::from_secs(1)).await.unwrap(), 42);
    }
}
