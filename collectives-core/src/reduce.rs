//! All-to-one reduce: every rank supplies an input range, folds it locally
//! against a caller-supplied `init` and associative `op` (§4.5: "Each rank
//! first folds its local range as `fold(init, range, op)` to obtain a local
//! value"), and the tree then combines every rank's local value, the same
//! two-step shape `reduce_binary.hpp`'s `operator()(input_beg, input_end,
//! init, op, output)` uses (`std::reduce(input_beg, input_end, init, op)`
//! before combining with children).
//!
//! Binary-tree reduce combines a node's two children in a fixed order — odd
//! slot before even slot, regardless of which one's message actually
//! arrives first — so the result is deterministic whenever `op` is
//! associative, even if it isn't commutative. Binomial-tree reduce combines
//! values in the order its rounds deliver them, which depends on the tree's
//! shape; it is only guaranteed deterministic when `op` is also commutative.
//! This asymmetry is inherited, not accidental: see the data model's
//! discussion of why only the binary variant was worth fixing.

use std::sync::Arc;

use collectives_runtime::{Context, DualSlot, SeqSlot, SingleSlot};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::policy::{trailing_barrier, Completion, Mode};
use crate::topology::{abs_rank, pow2_split, rel_rank, BinaryNode, FanIn, Role, Slot};
use crate::wire::Serialization;

fn object_name(kind: &str, root: usize) -> String {
    format!("reduce-{kind}-root{root}")
}

fn run_binary<T, S>(ctx: &Context, root: usize, value: T, op: &impl Fn(T, T) -> T) -> Option<T>
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let mailbox: Arc<Vec<DualSlot>> = ctx.distributed_object(&object_name("binary", root), |_| DualSlot::default());
    let node = BinaryNode::new(rel);

    let mut acc = value;
    if node.left(n).is_some() {
        let other: T = S::decode(&mailbox[rel].recv_odd(ctx));
        acc = op(acc, other);
    }
    if node.right(n).is_some() {
        let other: T = S::decode(&mailbox[rel].recv_even(ctx));
        acc = op(acc, other);
    }

    match node.parent() {
        Some(parent) => {
            let target = abs_rank(parent, root, n);
            let payload = S::encode(&acc);
            let mailbox = mailbox.clone();
            match BinaryNode::new(parent).slot_of_child(rel) {
                Slot::Odd => ctx.remote_async(target, move || mailbox[parent].publish_odd(payload)),
                Slot::Even => ctx.remote_async(target, move || mailbox[parent].publish_even(payload)),
            }
            None
        }
        None => Some(acc),
    }
}

fn run_binomial<T, S>(ctx: &Context, root: usize, value: T, op: &impl Fn(T, T) -> T) -> Option<T>
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let (p, extra) = pow2_split(n);
    let mailbox: Arc<Vec<SeqSlot>> =
        ctx.distributed_object(&object_name("binomial", root), |_| SeqSlot::default());
    let extra_mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binomial-extra", root), |_| SingleSlot::default());

    let mut acc = value;

    // A rank at or beyond `p` never joins the power-of-two core tree; it
    // folds into its partner `rel - p` directly and drops out, like a leaf
    // with no children.
    if rel >= p {
        let target = abs_rank(rel - p, root, n);
        let payload = S::encode(&acc);
        let extra_mailbox = extra_mailbox.clone();
        let partner = rel - p;
        ctx.remote_async(target, move || extra_mailbox[partner].publish(payload));
        return None;
    }

    if rel < extra {
        let bytes = extra_mailbox[rel].recv(ctx);
        acc = op(acc, S::decode(&bytes));
    }

    // Each round's mailbox slot is reused by every subsequent round (the
    // mailbox record shape in §3's data model has no per-round generation
    // tag), so a fast sender several rounds ahead of a slow receiver could
    // otherwise land its payload in the wrong round's consume. A barrier
    // after every round bounds that window, at the cost of the round count's
    // worth of synchronization per call — see the §9 discussion of this
    // tradeoff.
    let round_barrier = format!("{}-round-barrier", object_name("binomial", root));
    for role in FanIn::new(rel, p) {
        match role {
            Role::Send { to } => {
                let target = abs_rank(to, root, n);
                let payload = S::encode(&acc);
                let mailbox = mailbox.clone();
                ctx.remote_async(target, move || mailbox[to].append(payload));
            }
            Role::Receive { .. } => {
                for buf in mailbox[rel].recv_all(ctx) {
                    acc = op(acc, S::decode(&buf));
                }
            }
            Role::Idle => {}
        }
        // A retired sender still crosses every remaining round's barrier
        // (as a no-op) so the barrier's participant count, fixed to `p` at
        // first use, never comes up short.
        ctx.barrier_n(&round_barrier, p);
    }

    (rel == 0).then_some(acc)
}

/// Binary-tree reduce. Each rank folds `input` against `init` with `op` to
/// get its local value (§4.5), then the tree combines every rank's local
/// value; `Some(result)` at `root`, `None` everywhere else.
pub fn reduce_binary<T, M, S>(
    ctx: Context,
    root: usize,
    input: impl IntoIterator<Item = T>,
    init: T,
    op: impl Fn(T, T) -> T + Send + 'static,
) -> Completion<(Option<T>, Context)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let local = input.into_iter().fold(init, &op);
        let result = run_binary::<T, S>(&ctx, root, local, &op);
        trailing_barrier::<M>(&ctx, &object_name("binary-final", root));
        (result, ctx)
    })
}

/// Binomial-tree reduce. Each rank folds `input` against `init` with `op` to
/// get its local value (§4.5), same as [`reduce_binary`]. Correct for any
/// rank count (see [`crate::topology::pow2_split`]); deterministic only when
/// `op` is also commutative.
pub fn reduce_binomial<T, M, S>(
    ctx: Context,
    root: usize,
    input: impl IntoIterator<Item = T>,
    init: T,
    op: impl Fn(T, T) -> T + Send + 'static,
) -> Completion<(Option<T>, Context)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let local = input.into_iter().fold(init, &op);
        let result = run_binomial::<T, S>(&ctx, root, local, &op);
        trailing_barrier::<M>(&ctx, &object_name("binomial-final", root));
        (result, ctx)
    })
}
