//! Stands up a [`Context`] per rank and runs a closure on each, mirroring
//! `timely_communication::initialize`'s `WorkerGuards` shape: one
//! `std::thread::Builder`-spawned thread per rank, joined back into a single
//! `Vec` of results (or the first error, with every other thread still
//! joined so nothing leaks).

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::barrier::BarrierRegistry;
use crate::config::Configuration;
use crate::context::Context;
use crate::error::CollectivesError;
use crate::logging::{Logger, RuntimeEvent};

/// The joined results of every rank thread spawned by [`initialize`].
///
/// Unlike `timely_communication::WorkerGuards`, ranks here never outlive the
/// call to [`WorkerGuards::join`] — there is no detached background
/// execution mode, so this struct only exists to carry results back out.
pub struct WorkerGuards<T> {
    handles: Vec<JoinHandle<T>>,
}

impl<T> WorkerGuards<T> {
    /// Joins every rank thread and returns their results in rank order.
    ///
    /// Panics if any rank thread panicked, carrying that panic across the
    /// join the same way `timely_communication::WorkerGuards::join` does:
    /// a collective that deadlocks or mis-synchronizes is expected to be
    /// visible as a panic, not swallowed.
    pub fn join(self) -> Vec<T> {
        self.handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    }
}

fn spawn_ranks<T, F>(ranks: usize, logger: Logger, func: F) -> Result<WorkerGuards<T>, CollectivesError>
where
    T: Send + 'static,
    F: Fn(Context) -> T + Send + Sync + 'static,
{
    let func = Arc::new(func);

    let (senders, receivers): (Vec<_>, Vec<_>) = (0..ranks).map(|_| mpsc::channel()).unzip();
    let senders = Arc::new(senders);
    let barriers = Arc::new(BarrierRegistry::new(ranks));
    let objects = Context::new_object_registry();

    let receivers: Vec<Mutex<Option<_>>> = receivers.into_iter().map(|r| Mutex::new(Some(r))).collect();
    let mut handles = Vec::with_capacity(ranks);

    for (rank, receiver_slot) in receivers.into_iter().enumerate() {
        let inbox = receiver_slot
            .lock()
            .expect("inbox receiver lock poisoned")
            .take()
            .expect("inbox receiver already taken");

        let senders = senders.clone();
        let barriers = barriers.clone();
        let objects = objects.clone();
        let logger = logger.clone();
        let func = func.clone();

        let handle = std::thread::Builder::new()
            .name(format!("rank-{rank}"))
            .spawn(move || {
                let ctx = Context::new(rank, ranks, senders, inbox, barriers, objects, logger);
                func(ctx)
            })
            .map_err(CollectivesError::Spawn)?;

        handles.push(handle);
    }

    Ok(WorkerGuards { handles })
}

/// Spawns one thread per rank named by `config`, each running `func` with
/// its own [`Context`], and returns a handle to collect their results.
///
/// This is the runtime adapter's entry point, playing the part
/// `timely_communication::initialize` plays for a timely computation: it is
/// the only place a world's worth of ranks gets created.
pub fn initialize<T, F>(config: Configuration, func: F) -> Result<WorkerGuards<T>, CollectivesError>
where
    T: Send + 'static,
    F: Fn(Context) -> T + Send + Sync + 'static,
{
    spawn_ranks(config.ranks(), Logger::silent(), func)
}

/// Runs `func` once per rank named by `config` with logging enabled,
/// forwarding every [`RuntimeEvent`] to `sink`.
pub fn initialize_logged<T, F>(
    config: Configuration,
    sink: Arc<dyn Fn(Duration, &RuntimeEvent) + Send + Sync>,
    func: F,
) -> Result<WorkerGuards<T>, CollectivesError>
where
    T: Send + 'static,
    F: Fn(Context) -> T + Send + Sync + 'static,
{
    spawn_ranks(config.ranks(), Logger::new(sink), func)
}
