//! One-to-all scatter: the root holds one segment per relative rank and
//! distributes exactly one segment to each.
//!
//! `segments[i]` is the value destined for the rank at *relative* position
//! `i` from the root (see [`crate::topology::rel_rank`]) — callers assemble
//! `segments` already rotated into the root's frame.
//!
//! Both variants resolve the Open Question the source leaves for scatter:
//! segment ranges are recomputed from the current round's mask rather than
//! carried forward through a running `seg_end` that can drift, and a binary
//! node forwards each child only that child's own subtree slice, never the
//! whole residual bundle it's still holding onto for itself.

use std::collections::HashMap;
use std::sync::Arc;

use collectives_runtime::{Context, SeqSlot, SingleSlot};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::policy::{trailing_barrier, Completion, Mode};
use crate::topology::{abs_rank, pow2_split, rel_rank, BinaryNode};
use crate::wire::Serialization;

fn object_name(kind: &str, root: usize) -> String {
    format!("scatter-{kind}-root{root}")
}

/// Splits a flat `N·B`-element range into `n` contiguous per-rank blocks of
/// `B` elements each, in rank order — the root-side helper that turns the
/// spec's `[beg, end)` input range into the `segments` this module's
/// algorithms actually move.
///
/// Resolves §9's scatter/gather Open Question: an `input` length not evenly
/// divisible by `n` is rejected eagerly rather than silently truncated.
pub fn into_blocks<T: Clone>(input: &[T], n: usize) -> Vec<Vec<T>> {
    assert!(n > 0, "scatter requires at least one rank");
    assert_eq!(
        input.len() % n,
        0,
        "scatter input length {} is not evenly divisible by {n} ranks",
        input.len(),
    );
    let block_size = input.len() / n;
    input.chunks(block_size).map(<[T]>::to_vec).collect()
}

/// Every relative rank in the subtree rooted at `r`, `r` included.
fn subtree_members(r: usize, n: usize) -> Vec<usize> {
    let mut out = vec![r];
    let node = BinaryNode::new(r);
    if let Some(l) = node.left(n) {
        out.extend(subtree_members(l, n));
    }
    if let Some(rr) = node.right(n) {
        out.extend(subtree_members(rr, n));
    }
    out
}

fn run_binary<T, S>(ctx: &Context, root: usize, segments: Option<Vec<T>>) -> T
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let mailbox: Arc<Vec<SeqSlot>> = ctx.distributed_object(&object_name("binary", root), |_| SeqSlot::default());

    let mut mine: HashMap<usize, T> = if rel == 0 {
        segments
            .expect("scatter root must supply one segment per rank")
            .into_iter()
            .enumerate()
            .collect()
    } else {
        let mut received = mailbox[rel].recv_all(ctx);
        debug_assert_eq!(received.len(), 1, "a binary scatter node is only ever sent one bundle");
        S::decode(&received.pop().expect("binary scatter node received no bundle"))
    };

    let own = mine.remove(&rel).expect("scatter bundle missing this rank's own segment");

    let node = BinaryNode::new(rel);
    for child in [node.left(n), node.right(n)].into_iter().flatten() {
        let members = subtree_members(child, n);
        let slice: HashMap<usize, T> =
            members.iter().filter_map(|k| mine.remove(k).map(|v| (*k, v))).collect();
        let target = abs_rank(child, root, n);
        let payload = S::encode(&slice);
        let mailbox = mailbox.clone();
        ctx.remote_async(target, move || mailbox[child].append(payload));
    }

    own
}

fn run_binomial<T, S>(ctx: &Context, root: usize, segments: Option<Vec<T>>) -> T
where
    T: Serialize + DeserializeOwned + Clone,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let (p, _extra) = pow2_split(n);
    let mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binomial", root), |_| SingleSlot::default());
    let extra_mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binomial-extra", root), |_| SingleSlot::default());

    // A rank at or beyond `p` never joins the power-of-two core tree; the
    // root addresses its segment to it directly, below.
    if rel >= p {
        let bytes = extra_mailbox[rel].recv(ctx);
        return S::decode(&bytes);
    }

    let mut block: HashMap<usize, T> = if rel == 0 {
        let segments = segments.expect("scatter root must supply one segment per rank");
        for extra_rel in p..n {
            let target = abs_rank(extra_rel, root, n);
            let payload = S::encode(&segments[extra_rel]);
            let extra_mailbox = extra_mailbox.clone();
            ctx.remote_async(target, move || extra_mailbox[extra_rel].publish(payload));
        }
        segments.into_iter().enumerate().filter(|(k, _)| *k < p).collect()
    } else {
        HashMap::new()
    };

    let mut mask = p / 2;
    while mask >= 1 {
        let block_size = mask * 2;
        if rel % block_size == 0 {
            if block.is_empty() {
                // Not yet this block's holder; wait for a future, smaller round.
            } else {
                let base = rel;
                let upper: HashMap<usize, T> =
                    block.iter().filter(|(k, _)| **k >= base + mask).map(|(k, v)| (*k, v.clone())).collect();
                let to = base + mask;
                if to < p && !upper.is_empty() {
                    block.retain(|k, _| *k < base + mask);
                    let target = abs_rank(to, root, n);
                    let payload = S::encode(&upper);
                    let mailbox = mailbox.clone();
                    ctx.remote_async(target, move || mailbox[to].publish(payload));
                }
            }
        } else if rel % block_size == mask && block.is_empty() {
            let bytes = mailbox[rel].recv(ctx);
            block = S::decode(&bytes);
        }
        mask /= 2;
    }

    block.remove(&rel).expect("scatter binomial node never received its own segment")
}

/// Binary-tree scatter.
pub fn scatter_binary<T, M, S>(ctx: Context, root: usize, segments: Option<Vec<T>>) -> Completion<(T, Context)>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let result = run_binary::<T, S>(&ctx, root, segments);
        trailing_barrier::<M>(&ctx, &object_name("binary-final", root));
        (result, ctx)
    })
}

/// Binomial-tree scatter. Correct for any rank count (see
/// [`crate::topology::pow2_split`] for how a non-power-of-two count is folded
/// into the power-of-two core exchange).
pub fn scatter_binomial<T, M, S>(ctx: Context, root: usize, segments: Option<Vec<T>>) -> Completion<(T, Context)>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
    M: Mode,
    S: Serialization,
{
    M::complete(move || {
        let result = run_binomial::<T, S>(&ctx, root, segments);
        trailing_barrier::<M>(&ctx, &object_name("binomial-final", root));
        (result, ctx)
    })
}
