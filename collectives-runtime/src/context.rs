//! Per-rank handle into a running [`crate::World`].
//!
//! `Context` plays the role `hpx::async` plus a locality id play in the
//! source: it is how a rank's thread reaches another rank (`remote_async`),
//! waits for every rank to reach the same point (`barrier`), and gets at the
//! one shared, collectively-addressed object all ranks agree to call by the
//! same name (`distributed_object`). There is no separate scheduler thread
//! behind any of this — a "remote" call is a closure pushed onto the target
//! rank's own inbox, drained the next time that rank's thread pumps it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::barrier::BarrierRegistry;
use crate::logging::{Logger, RuntimeEvent};

/// A unit of work dispatched to a rank's inbox. Boxed and type-erased the
/// same way `timely_communication`'s allocator channels erase their message
/// type behind `Box<dyn Any + Send>`, except here what crosses the boundary
/// is a closure rather than data.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct ObjectRegistry {
    map: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ObjectRegistry {
    /// Returns the replica set registered under `name`, building it (one
    /// replica per rank, via `make`) the first time any rank asks for it.
    ///
    /// This is a simplification of true collective construction: rather than
    /// each rank constructing and publishing its own replica, the first
    /// caller to win the registry's mutex builds every replica up front.
    /// Since no rank can observe the map entry until it is fully inserted,
    /// every subsequent caller (including the rank that "lost" the race)
    /// sees the same complete, consistent set.
    fn get_or_init<S: Send + Sync + 'static>(
        &self,
        name: &str,
        ranks: usize,
        make: impl Fn(usize) -> S,
    ) -> Arc<Vec<S>> {
        let mut map = self.map.lock().expect("object registry lock poisoned");
        let entry = map.entry(name.to_string()).or_insert_with(|| {
            let replicas: Vec<S> = (0..ranks).map(&make).collect();
            Arc::new(replicas) as Arc<dyn Any + Send + Sync>
        });
        entry
            .clone()
            .downcast::<Vec<S>>()
            .unwrap_or_else(|_| panic!("distributed object {name:?} requested at a different type than it was created with"))
    }
}

/// A rank's view of the running collective runtime.
///
/// Cloning a `Context` is cheap and shares the same world state; it is not,
/// however, `Sync`-safe to pump the same rank's inbox from two threads at
/// once, so each rank's own inbox receiver is owned exclusively by that
/// rank's `Context`.
pub struct Context {
    rank: usize,
    ranks: usize,
    senders: Arc<Vec<Sender<Job>>>,
    inbox: Receiver<Job>,
    barriers: Arc<BarrierRegistry>,
    objects: Arc<ObjectRegistry>,
    logger: Logger,
}

impl Context {
    pub(crate) fn new(
        rank: usize,
        ranks: usize,
        senders: Arc<Vec<Sender<Job>>>,
        inbox: Receiver<Job>,
        barriers: Arc<BarrierRegistry>,
        objects: Arc<ObjectRegistry>,
        logger: Logger,
    ) -> Self {
        Context { rank, ranks, senders, inbox, barriers, objects, logger }
    }

    pub(crate) fn new_object_registry() -> Arc<ObjectRegistry> {
        Arc::new(ObjectRegistry::default())
    }

    /// The number of ranks participating in this world.
    pub fn rank_count(&self) -> usize {
        self.ranks
    }

    /// This thread's own rank id, in `0..rank_count()`.
    pub fn rank_id(&self) -> usize {
        self.rank
    }

    /// Enqueues `job` onto `target`'s inbox and returns immediately; `target`
    /// runs it the next time it pumps (either directly, via [`Self::pump`],
    /// or while spinning in [`Self::spin_until`]).
    ///
    /// Calling this with `target == self.rank_id()` is legal and simply
    /// queues the job for this same rank to run later.
    pub fn remote_async(&self, target: usize, job: impl FnOnce() + Send + 'static) {
        self.logger.log(RuntimeEvent::Dispatch { from: self.rank, to: target });
        let _ = self.senders[target].send(Box::new(job));
    }

    /// Runs every job currently sitting in this rank's inbox without blocking.
    pub fn pump(&self) {
        while let Ok(job) = self.inbox.try_recv() {
            job();
        }
    }

    /// Pumps this rank's inbox and yields until `cond` returns true.
    ///
    /// This is the rendering of the source's busy-wait on a mailbox flag:
    /// since there is no independent scheduler thread to deliver the write
    /// that will make `cond` true, this loop must itself run whatever job
    /// performs that write, which is why it pumps rather than parking.
    pub fn spin_until<F: FnMut() -> bool>(&self, mut cond: F) {
        loop {
            if cond() {
                return;
            }
            self.pump();
            std::thread::yield_now();
        }
    }

    /// Blocks until every rank has called `barrier` with the same `name`.
    ///
    /// Barriers are created lazily and reused by name, the same way the
    /// source reuses a single `"wait_for_completion"` barrier across a
    /// collective's rounds; distinct names let independent collectives
    /// synchronize without interfering with one another.
    pub fn barrier(&self, name: &str) {
        self.logger.log(RuntimeEvent::BarrierEnter { rank: self.rank, name: name.to_string() });
        self.barriers.get(name).wait();
        self.logger.log(RuntimeEvent::BarrierExit { rank: self.rank, name: name.to_string() });
    }

    /// Like [`Self::barrier`], but for a sub-group barrier shared by only
    /// `participants` ranks rather than the whole world — e.g. binomial
    /// reduce's per-round barrier, which only the power-of-two core of ranks
    /// it runs its exchange over needs to cross.
    pub fn barrier_n(&self, name: &str, participants: usize) {
        self.logger.log(RuntimeEvent::BarrierEnter { rank: self.rank, name: name.to_string() });
        self.barriers.get_sized(name, participants).wait();
        self.logger.log(RuntimeEvent::BarrierExit { rank: self.rank, name: name.to_string() });
    }

    /// Returns the replica set shared under `name`, one replica per rank,
    /// building it via `make` if this is the first rank to ask for it.
    ///
    /// Every rank in a collective must request the same `name` with a
    /// `make` that produces a default/empty replica (the collective then
    /// fills in each replica's mailbox slots as it runs).
    pub fn distributed_object<S: Send + Sync + 'static>(
        &self,
        name: &str,
        make: impl Fn(usize) -> S,
    ) -> Arc<Vec<S>> {
        self.objects.get_or_init(name, self.ranks, make)
    }

    pub(crate) fn log_mailbox_wait_begin(&self) {
        self.logger.log(RuntimeEvent::MailboxWaitBegin { rank: self.rank });
    }

    pub(crate) fn log_mailbox_wait_end(&self) {
        self.logger.log(RuntimeEvent::MailboxWaitEnd { rank: self.rank });
    }
}
