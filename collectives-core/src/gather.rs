//! All-to-one gather: every rank contributes one value, the root collects
//! all of them (ordered by relative rank), every other rank gets nothing.

use std::collections::HashMap;
use std::sync::Arc;

use collectives_runtime::{Context, DualSeqSlot, SeqSlot, SingleSlot};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::policy::{trailing_barrier, Completion, Mode};
use crate::topology::{abs_rank, pow2_split, rel_rank, BinaryNode, FanIn, Role, Slot};
use crate::wire::Serialization;

fn object_name(kind: &str, root: usize) -> String {
    format!("gather-{kind}-root{root}")
}

/// Concatenates each rank's `B`-element block, in rank order, into the flat
/// `N·B`-element range the root's output iterator expects — the inverse of
/// [`crate::scatter::into_blocks`].
pub fn concat_blocks<T>(blocks: Vec<Vec<T>>) -> Vec<T> {
    blocks.into_iter().flatten().collect()
}

fn run_binary<T, S>(ctx: &Context, root: usize, value: T) -> Option<Vec<T>>
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let mailbox: Arc<Vec<DualSeqSlot>> =
        ctx.distributed_object(&object_name("binary", root), |_| DualSeqSlot::default());
    let node = BinaryNode::new(rel);

    let mut collected: HashMap<usize, T> = HashMap::new();
    collected.insert(rel, value);

    if node.left(n).is_some() {
        for buf in mailbox[rel].recv_odd(ctx) {
            collected.extend(S::decode::<HashMap<usize, T>>(&buf));
        }
    }
    if node.right(n).is_some() {
        for buf in mailbox[rel].recv_even(ctx) {
            collected.extend(S::decode::<HashMap<usize, T>>(&buf));
        }
    }

    match node.parent() {
        Some(parent) => {
            let target = abs_rank(parent, root, n);
            let payload = S::encode(&collected);
            let mailbox = mailbox.clone();
            match BinaryNode::new(parent).slot_of_child(rel) {
                Slot::Odd => ctx.remote_async(target, move || mailbox[parent].append_odd(payload)),
                Slot::Even => ctx.remote_async(target, move || mailbox[parent].append_even(payload)),
            }
            None
        }
        None => Some(ordered(collected)),
    }
}

fn run_binomial<T, S>(ctx: &Context, root: usize, value: T) -> Option<Vec<T>>
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

    let mut collected: HashMap<usize, T> = HashMap::new();
    collected.insert(rel, value);

    // A rank at or beyond `p` never joins the power-of-two core tree; it
    // hands its (singleton) contribution straight to its partner `rel - p`
    // and drops out, mirroring a leaf with no children.
    if rel >= p {
        let target = abs_rank(rel - p, root, n);
        let payload = S::encode(&collected);
        let extra_mailbox = extra_mailbox.clone();
        let partner = rel - p;
        ctx.remote_async(target, move || extra_mailbox[partner].publish(payload));
        return None;
    }

    if rel < extra {
        let bytes = extra_mailbox[rel].recv(ctx);
        collected.extend(S::decode::<HashMap<usize, T>>(&bytes));
    }

    // Same mailbox-reuse-across-rounds hazard as reduce-binomial (§4.5,
    // §9): without a per-round barrier, a sender several rounds ahead of a
    // slow receiver could land its payload in the wrong round's `recv_all`,
    // leaving a later round's call waiting on data that already arrived and
    // was consumed. The value itself would still land in `collected`
    // correctly (it's keyed by sender rank, not round), but the receiver
    // would then spin forever on a round nothing more is coming for.
    let round_barrier = format!("{}-round-barrier", object_name("binomial", root));
    for role in FanIn::new(rel, p) {
        match role {
            Role::Send { to } => {
                let target = abs_rank(to, root, n);
                let payload = S::encode(&collected);
                let mailbox = mailbox.clone();
                ctx.remote_async(target, move || mailbox[to].append(payload));
            }
            Role::Receive { .. } => {
                for buf in mailbox[rel].recv_all(ctx) {
                    collected.extend(S::decode::<HashMap<usize, T>>(&buf));
                }
            }
            Role::Idle => {}
        }
        ctx.barrier_n(&round_barrier, p);
    }

    (rel == 0).then(|| ordered(collected))
}

fn ordered<T>(collected: HashMap<usize, T>) -> Vec<T> {
    let mut entries: Vec<(usize, T)> = collected.into_iter().collect();
    entries.sort_by_key(|(k, _)| *k);
    entries.into_iter().map(|(_, v)| v).collect()
}

/// Binary-tree gather. `Some(values)` at `root`, ordered by relative rank;
/// `None` everywhere else.
pub fn gather_binary<T, M, S>(ctx: Context, root: usize, value: T) -> Completion<(Option<Vec<T>>, Context)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let result = run_binary::<T, S>(&ctx, root, value);
        trailing_barrier::<M>(&ctx, &object_name("binary-final", root));
        (result, ctx)
    })
}

/// Binomial-tree gather. Correct for any rank count (see
/// [`crate::topology::pow2_split`]).
pub fn gather_binomial<T, M, S>(ctx: Context, root: usize, value: T) -> Completion<(Option<Vec<T>>, Context)>
where
    T: Serialize + DeserializeOwned + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let result = run_binomial::<T, S>(&ctx, root, value);
        trailing_barrier::<M>(&ctx, &object_name("binomial-final", root));
        (result, ctx)
    })
}
