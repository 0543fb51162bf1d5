//! One-to-all broadcast: the root's value reaches every rank, either by a
//! binary tree or a binomial tree; both handle an arbitrary rank count.
//!
//! Both variants forward the *encoded bytes* they received rather than
//! re-encoding the decoded value at each hop — matching the behavior named
//! explicitly as required rather than a bug in the source's binary variant —
//! so a node only ever decodes once, on its way out of the collective.

use std::sync::Arc;

use collectives_runtime::{Context, SingleSlot};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::policy::{trailing_barrier, Completion, Mode};
use crate::topology::{abs_rank, fanout_role, fanout_rounds, pow2_split, rel_rank, BinaryNode, Role};
use crate::wire::Serialization;

fn object_name(kind: &str, root: usize) -> String {
    format!("broadcast-{kind}-root{root}")
}

fn run_binary<T, S>(ctx: &Context, root: usize, value: Option<T>) -> T
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binary", root), |_| SingleSlot::default());

    let bytes = if rel == 0 {
        S::encode(&value.expect("broadcast root must supply a value"))
    } else {
        mailbox[rel].recv(ctx)
    };

    let node = BinaryNode::new(rel);
    for child in [node.left(n), node.right(n)].into_iter().flatten() {
        let target = abs_rank(child, root, n);
        let payload = bytes.clone();
        let mailbox = mailbox.clone();
        ctx.remote_async(target, move || mailbox[child].publish(payload));
    }

    S::decode(&bytes)
}

fn run_binomial<T, S>(ctx: &Context, root: usize, value: Option<T>) -> T
where
    T: Serialize + DeserializeOwned,
    S: Serialization,
{
    let n = ctx.rank_count();
    let me = ctx.rank_id();
    let rel = rel_rank(me, root, n);
    let (p, extra) = pow2_split(n);
    let mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binomial", root), |_| SingleSlot::default());
    let extra_mailbox: Arc<Vec<SingleSlot>> =
        ctx.distributed_object(&object_name("binomial-extra", root), |_| SingleSlot::default());

    // A rank at or beyond `p` sits outside the power-of-two core tree
    // entirely; it only ever waits for its low-numbered partner to forward
    // the value once the core tree has it.
    if rel >= p {
        let bytes = extra_mailbox[rel].recv(ctx);
        return S::decode(&bytes);
    }

    let mut bytes = if rel == 0 {
        S::encode(&value.expect("broadcast root must supply a value"))
    } else {
        Vec::new()
    };
    let mut received = rel == 0;

    for round in 0..fanout_rounds(p) {
        match fanout_role(rel, round, p) {
            Role::Send { to } if received => {
                let target = abs_rank(to, root, n);
                let payload = bytes.clone();
                let mailbox = mailbox.clone();
                ctx.remote_async(target, move || mailbox[to].publish(payload));
            }
            Role::Send { .. } => {}
            Role::Receive { .. } => {
                bytes = mailbox[rel].recv(ctx);
                received = true;
            }
            Role::Idle => {}
        }
    }

    // Fold the `extra` ranks back in: each low-numbered rank `< extra` has
    // exactly one high-numbered partner (`rel + p`) waiting on its own copy.
    if rel < extra {
        let to = rel + p;
        let target = abs_rank(to, root, n);
        let payload = bytes.clone();
        let extra_mailbox = extra_mailbox.clone();
        ctx.remote_async(target, move || extra_mailbox[to].publish(payload));
    }

    S::decode(&bytes)
}

/// Binary-tree broadcast under a chosen [`Mode`] and wire [`Serialization`].
///
/// `value` must be `Some` at `root` and is ignored everywhere else. Returns
/// the broadcast value together with the [`Context`] passed in, so the
/// caller keeps using the same `Context` afterward regardless of which
/// [`Mode`] it ran under.
pub fn broadcast_binary<T, M, S>(ctx: Context, root: usize, value: Option<T>) -> Completion<(T, Context)>
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

/// Binomial-tree broadcast. Correct for any rank count: a non-power-of-two
/// count folds its highest-numbered ranks onto low-numbered partners before
/// and after the power-of-two core exchange (see [`crate::topology::pow2_split`]).
pub fn broadcast_binomial<T, M, S>(ctx: Context, root: usize, value: Option<T>) -> Completion<(T, Context)>
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
