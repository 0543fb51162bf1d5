//! Structured logging for the runtime, modeled on `timely_logging`'s
//! `Registry`/`Logger` split: a shared sink, a common start instant, and a
//! typed event stream rather than ad hoc `println!`.
//!
//! The original is built on `Rc`/`RefCell` because every timely worker owns
//! its logger exclusively. Here a single [`Logger`] is shared by every rank
//! thread in a [`crate::World`], so the sink is `Arc<dyn Fn + Send + Sync>`
//! instead.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An event worth observing about the runtime's progress.
///
/// These are the diagnostic hook promised by the spin/livelock discussion:
/// nothing here is required for correctness, but a caller wiring up a sink
/// can watch `MailboxWaitBegin` without a matching `MailboxWaitEnd` to
/// notice a stuck rank.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A boxed job was enqueued for a remote rank.
    Dispatch { from: usize, to: usize },
    /// A rank began spinning on a mailbox flag.
    MailboxWaitBegin { rank: usize },
    /// A rank observed its mailbox flag transition and stopped spinning.
    MailboxWaitEnd { rank: usize },
    /// A rank entered a named barrier.
    BarrierEnter { rank: usize, name: String },
    /// A rank was released from a named barrier.
    BarrierExit { rank: usize, name: String },
}

impl fmt::Display for RuntimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEvent::Dispatch { from, to } => write!(f, "dispatch {from} -> {to}"),
            RuntimeEvent::MailboxWaitBegin { rank } => write!(f, "rank {rank} waiting on mailbox"),
            RuntimeEvent::MailboxWaitEnd { rank } => write!(f, "rank {rank} resumed from mailbox"),
            RuntimeEvent::BarrierEnter { rank, name } => write!(f, "rank {rank} entering barrier {name:?}"),
            RuntimeEvent::BarrierExit { rank, name } => write!(f, "rank {rank} released from barrier {name:?}"),
        }
    }
}

type Sink = Arc<dyn Fn(Duration, &RuntimeEvent) + Send + Sync>;

/// A cheaply-cloneable handle used by every rank thread to emit [`RuntimeEvent`]s.
///
/// Cloning shares the same sink and start instant, so timestamps logged by
/// different ranks are directly comparable, the same guarantee
/// `timely_logging::Logger` makes for a single worker's event stream.
#[derive(Clone)]
pub struct Logger {
    start: Instant,
    sink: Option<Sink>,
}

impl Logger {
    /// A logger that discards every event; the default for a `World` that
    /// hasn't been asked to observe itself.
    pub fn silent() -> Self {
        Logger { start: Instant::now(), sink: None }
    }

    /// A logger that forwards every event (with its elapsed timestamp) to `sink`.
    pub fn new(sink: Sink) -> Self {
        Logger { start: Instant::now(), sink: Some(sink) }
    }

    /// Records `event`, timestamped against this logger's shared start instant.
    pub fn log(&self, event: RuntimeEvent) {
        if let Some(sink) = &self.sink {
            (sink)(self.start.elapsed(), &event);
        }
    }
}
