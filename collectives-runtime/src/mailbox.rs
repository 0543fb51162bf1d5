//! The tagged mailbox records that back a distributed object replica.
//!
//! Each variant corresponds to one row of the data model's record table: a
//! flag toggled between "empty" and "full" guarding one or more byte-string
//! payload slots. A sender publishes its payload *then* flips the flag with
//! `Ordering::Release`; a receiver spins a `compare_exchange` with
//! `Ordering::Acquire` until it observes the flip, which is the release/acquire
//! fence §9 asks for in place of the source's unordered atomic toggle.
//!
//! "Spinning" here also means pumping the rank's own inbox (see
//! [`crate::context::Context::spin_until`]), since in this intra-process
//! runtime there is no separate scheduler thread to deliver a remote write —
//! the receiving rank's own thread has to run the job that performs it.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use crate::context::Context;

const EMPTY: i32 = 0;
const FULL: i32 = 1;

fn take_flag(flag: &AtomicI32, ctx: &Context) {
    ctx.log_mailbox_wait_begin();
    ctx.spin_until(|| flag.compare_exchange(FULL, EMPTY, Ordering::Acquire, Ordering::Relaxed).is_ok());
    ctx.log_mailbox_wait_end();
}

/// `(flag, payload)` — used by broadcast and scatter-binomial.
#[derive(Default)]
pub struct SingleSlot {
    flag: AtomicI32,
    payload: Mutex<Vec<u8>>,
}

impl SingleSlot {
    /// Publishes `bytes` and flips the flag full. Called from the sender's thread,
    /// operating on the *target* rank's replica.
    pub fn publish(&self, bytes: Vec<u8>) {
        *self.payload.lock().expect("mailbox payload lock poisoned") = bytes;
        self.flag.store(FULL, Ordering::Release);
    }

    /// Spins until a payload has been published, then consumes it.
    pub fn recv(&self, ctx: &Context) -> Vec<u8> {
        take_flag(&self.flag, ctx);
        std::mem::take(&mut *self.payload.lock().expect("mailbox payload lock poisoned"))
    }
}

/// `(flag_odd, flag_even, payload_odd, payload_even)` — used by reduce-binary.
#[derive(Default)]
pub struct DualSlot {
    flag_odd: AtomicI32,
    flag_even: AtomicI32,
    payload_odd: Mutex<Vec<u8>>,
    payload_even: Mutex<Vec<u8>>,
}

impl DualSlot {
    /// Publishes into the odd slot (conventionally: the sender is an odd-indexed child).
    pub fn publish_odd(&self, bytes: Vec<u8>) {
        *self.payload_odd.lock().expect("mailbox payload lock poisoned") = bytes;
        self.flag_odd.store(FULL, Ordering::Release);
    }

    /// Publishes into the even slot (conventionally: the sender is an even-indexed child).
    pub fn publish_even(&self, bytes: Vec<u8>) {
        *self.payload_even.lock().expect("mailbox payload lock poisoned") = bytes;
        self.flag_even.store(FULL, Ordering::Release);
    }

    /// Spins until the odd slot is full, then consumes it.
    pub fn recv_odd(&self, ctx: &Context) -> Vec<u8> {
        take_flag(&self.flag_odd, ctx);
        std::mem::take(&mut *self.payload_odd.lock().expect("mailbox payload lock poisoned"))
    }

    /// Spins until the even slot is full, then consumes it.
    pub fn recv_even(&self, ctx: &Context) -> Vec<u8> {
        take_flag(&self.flag_even, ctx);
        std::mem::take(&mut *self.payload_even.lock().expect("mailbox payload lock poisoned"))
    }
}

/// `(flag, payloads)` — used by reduce-binomial, gather-binomial, scatter-binary.
#[derive(Default)]
pub struct SeqSlot {
    flag: AtomicI32,
    payloads: Mutex<Vec<Vec<u8>>>,
}

impl SeqSlot {
    /// Appends `bytes` to the sequence and flips the flag full. Multiple senders
    /// may append across the life of a collective (never concurrently for the
    /// same flag cycle — the tree topology guarantees at most one writer
    /// between two consumes), so this is additive rather than overwriting.
    pub fn append(&self, bytes: Vec<u8>) {
        self.payloads.lock().expect("mailbox payload lock poisoned").push(bytes);
        self.flag.store(FULL, Ordering::Release);
    }

    /// Spins until at least one payload has been appended, then drains all of them.
    pub fn recv_all(&self, ctx: &Context) -> Vec<Vec<u8>> {
        take_flag(&self.flag, ctx);
        std::mem::take(&mut *self.payloads.lock().expect("mailbox payload lock poisoned"))
    }
}

/// `(flag_odd, flag_even, payloads_odd, payloads_even)` — used by gather-binary.
#[derive(Default)]
pub struct DualSeqSlot {
    flag_odd: AtomicI32,
    flag_even: AtomicI32,
    payloads_odd: Mutex<Vec<Vec<u8>>>,
    payloads_even: Mutex<Vec<Vec<u8>>>,
}

impl DualSeqSlot {
    /// Appends into the odd slot.
    pub fn append_odd(&self, bytes: Vec<u8>) {
        self.payloads_odd.lock().expect("mailbox payload lock poisoned").push(bytes);
        self.flag_odd.store(FULL, Ordering::Release);
    }

    /// Appends into the even slot.
    pub fn append_even(&self, bytes: Vec<u8>) {
        self.payloads_even.lock().expect("mailbox payload lock poisoned").push(bytes);
        self.flag_even.store(FULL, Ordering::Release);
    }

    /// Spins until the odd slot has at least one payload, then drains it.
    pub fn recv_odd(&self, ctx: &Context) -> Vec<Vec<u8>> {
        take_flag(&self.flag_odd, ctx);
        std::mem::take(&mut *self.payloads_odd.lock().expect("mailbox payload lock poisoned"))
    }

    /// Spins until the even slot has at least one payload, then drains it.
    pub fn recv_even(&self, ctx: &Context) -> Vec<Vec<u8>> {
        take_flag(&self.flag_even, ctx);
        std::mem::take(&mut *self.payloads_even.lock().expect("mailbox payload lock poisoned"))
    }
}
