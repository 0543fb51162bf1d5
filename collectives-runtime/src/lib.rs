//! Intra-process active-message runtime adapter.
//!
//! This crate plays the part `hpx`'s runtime plays in the source: it gives
//! each rank a way to reach another rank asynchronously, to join the rest of
//! the world at a named barrier, and to address one object shared and
//! replicated across every rank by name. There is no networking here and
//! none is planned — every rank is a thread in this one process, and "remote"
//! dispatch is a boxed closure pushed onto the target thread's inbox. See
//! `collectives-core` for the tree topologies and collective operations built
//! on top of this adapter.

mod barrier;
mod config;
mod context;
mod error;
mod logging;
mod mailbox;
mod world;

pub use config::Configuration;
pub use context::{Context, Job};
pub use error::CollectivesError;
pub use logging::{Logger, RuntimeEvent};
pub use mailbox::{DualSeqSlot, DualSlot, SeqSlot, SingleSlot};
pub use world::{initialize, initialize_logged, WorkerGuards};
