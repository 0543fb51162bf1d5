//! Blocking vs. nonblocking completion, selected at compile time.
//!
//! The source returns `hpx::future<T>` from every collective and lets the
//! caller choose whether to `.get()` it immediately (blocking) or hold onto
//! it and poll later (nonblocking). This runtime adapter has no task
//! scheduler to hand a future to, and §4.6 only makes the *trailing barrier*
//! optional under `nonblocking` ("the call returns as soon as the local
//! state machine terminates; the caller assumes responsibility for a later
//! synchronization point") — the local send/receive exchange itself is not
//! optional under either policy. So both modes run a collective's state
//! machine inline, synchronously, on the calling thread; the only thing
//! [`Mode::BLOCKS_ON_COMPLETION`] gates is whether [`trailing_barrier`] waits
//! for every other rank to finish too before handing control back.

/// The result of running a collective operation under some [`Mode`].
///
/// Both [`Blocking`] and [`Nonblocking`] finish the collective's local state
/// machine before this is constructed, so [`Self::wait`] never actually
/// blocks on anything today — it exists so call sites written against a
/// generic `M: Mode` can call it uniformly rather than needing to know which
/// policy they got.
pub struct Completion<T>(T);

impl<T> Completion<T> {
    /// Returns the collective's result. A no-op today since both policies
    /// already finished their local work before handing back a `Completion`.
    pub fn wait(self) -> T {
        self.0
    }
}

/// Selects whether a collective operation imposes a trailing barrier after
/// its local state machine finishes (§4.6 of the design notes: under
/// `blocking`, a final collective barrier drains all in-flight remote writes
/// before the caller proceeds; under `nonblocking`, the caller takes on that
/// responsibility itself). The local exchange always runs to completion
/// under either policy; only the barrier is optional.
pub trait Mode {
    /// Whether this mode imposes the trailing barrier described above.
    const BLOCKS_ON_COMPLETION: bool;

    fn complete<T>(op: impl FnOnce() -> T) -> Completion<T>;
}

/// Runs the collective inline, followed by a collective barrier, so the call
/// doesn't return until every rank's in-flight sends have drained.
pub struct Blocking;

impl Mode for Blocking {
    const BLOCKS_ON_COMPLETION: bool = true;

    fn complete<T>(op: impl FnOnce() -> T) -> Completion<T> {
        Completion(op())
    }
}

/// Runs the collective inline, same as [`Blocking`], but skips the trailing
/// barrier: the call returns as soon as this rank's own state machine has
/// finished sending and receiving, without waiting for every other rank to
/// have drained its own in-flight sends.
pub struct Nonblocking;

impl Mode for Nonblocking {
    const BLOCKS_ON_COMPLETION: bool = false;

    fn complete<T>(op: impl FnOnce() -> T) -> Completion<T> {
        Completion(op())
    }
}

/// Crosses `ctx`'s named collective barrier iff `M` is [`Blocking`].
///
/// Every collective entry point in this crate calls this once its local
/// state machine has finished, right before handing its result back to the
/// caller — the uniform place §4.6's "optional trailing barrier when
/// blocking" is applied.
pub fn trailing_barrier<M: Mode>(ctx: &collectives_runtime::Context, name: &str) {
    if M::BLOCKS_ON_COMPLETION {
        ctx.barrier(name);
    }
}
