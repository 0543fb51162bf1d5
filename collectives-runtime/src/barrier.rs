//! A registry of reusable, named barriers.
//!
//! Grounded in `communication::allocator::process::Process`'s
//! `Arc<Mutex<HashMap<identifier, ...>>>` lazy-registration pattern: a barrier
//! is created the first time any rank asks for its name and shared by every
//! rank thereafter. The source reuses a single literal barrier name
//! (`"wait_for_completion"`) across an entire collective's rounds; naming
//! barriers here keeps that same one-barrier-per-synchronization-point shape
//! while letting distinct collectives run concurrently under distinct names.
//!
//! A barrier's participant count is fixed at first request. Most callers
//! (the blocking policy's trailing barrier, the demo binaries) want every
//! rank in the world; binomial reduce's per-round barrier instead involves
//! only the power-of-two core of ranks it runs its exchange over, so the
//! count is a parameter rather than always `ranks`.

use std::collections::HashMap;
use std::sync::{Arc, Barrier, Mutex};

/// Shared storage for every named barrier a [`crate::World`] has handed out.
#[derive(Default)]
pub struct BarrierRegistry {
    ranks: usize,
    barriers: Mutex<HashMap<String, Arc<Barrier>>>,
}

impl BarrierRegistry {
    pub fn new(ranks: usize) -> Self {
        BarrierRegistry { ranks, barriers: Mutex::new(HashMap::new()) }
    }

    /// Returns the barrier registered under `name`, creating it (sized to the
    /// full rank count) if this is the first request for that name.
    pub fn get(&self, name: &str) -> Arc<Barrier> {
        self.get_sized(name, self.ranks)
    }

    /// Returns the barrier registered under `name`, creating it sized to
    /// `participants` if this is the first request for that name. Every
    /// caller sharing `name` must agree on `participants`, the same way every
    /// rank in a collective must agree on its name and root.
    pub fn get_sized(&self, name: &str, participants: usize) -> Arc<Barrier> {
        let mut barriers = self.barriers.lock().expect("barrier registry lock poisoned");
        barriers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Barrier::new(participants)))
            .clone()
    }
}
