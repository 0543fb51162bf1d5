//! Integration coverage for each collective's binary and binomial variant,
//! run against the real thread-per-rank runtime rather than mocked mailboxes
//! — the same level `communication/examples/hello.rs` exercises
//! `initialize` at.

use collectives_core::{
    broadcast_binary, broadcast_binomial, concat_blocks, gather_binary, gather_binomial, into_blocks,
    reduce_binary, reduce_binomial, scatter_binary, scatter_binomial, BincodeBackend, Blocking, Nonblocking,
};
use collectives_runtime::{initialize, Configuration};

// B1: binary broadcast reaches every rank, for a rank count with no
// particular power-of-two structure.
#[test]
fn broadcast_binary_reaches_every_rank() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let (value, _ctx) = broadcast_binary::<i32, Blocking, BincodeBackend>(ctx, 0, Some(42)).wait();
        value
    })
    .expect("failed to start runtime");

    for value in guards.join() {
        assert_eq!(value, 42);
    }
}

// B2: binomial broadcast is correct from an arbitrary (non-zero) root, which
// exercises rank rotation rather than just the degenerate root-0 case.
#[test]
fn broadcast_binomial_honors_arbitrary_root() {
    let guards = initialize(Configuration::Process(8), |ctx| {
        let root = 3;
        let value = (ctx.rank_id() == root).then_some("hello from three".to_string());
        let (value, _ctx) = broadcast_binomial::<String, Blocking, BincodeBackend>(ctx, root, value).wait();
        value
    })
    .expect("failed to start runtime");

    for value in guards.join() {
        assert_eq!(value, "hello from three");
    }
}

// B1: a non-power-of-two rank count is not an error — the highest-numbered
// ranks fold onto low-numbered partners around the power-of-two core tree.
#[test]
fn broadcast_binomial_reaches_every_rank_at_non_power_of_two() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let value = (ctx.rank_id() == 0).then_some(42);
        let (value, _ctx) = broadcast_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, value).wait();
        value
    })
    .expect("failed to start runtime");

    for value in guards.join() {
        assert_eq!(value, 42);
    }
}

// S1: each rank receives exactly its own segment, none of anyone else's.
#[test]
fn scatter_binary_delivers_distinct_segments() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let segments = (ctx.rank_id() == 0)
            .then(|| (0..5).map(|i| format!("segment-{i}")).collect::<Vec<_>>());
        let (mine, _ctx) = scatter_binary::<String, Blocking, BincodeBackend>(ctx, 0, segments).wait();
        mine
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    results.sort();
    let mut expected: Vec<String> = (0..5).map(|i| format!("segment-{i}")).collect();
    expected.sort();
    assert_eq!(results, expected);
}

#[test]
fn scatter_binomial_delivers_distinct_segments() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let rank = ctx.rank_id();
        let segments = (rank == 0).then(|| vec![10, 20, 30, 40]);
        let (mine, _ctx) = scatter_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, segments).wait();
        (rank, mine)
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    results.sort_by_key(|(rank, _)| *rank);
    assert_eq!(results.into_iter().map(|(_, v)| v).collect::<Vec<_>>(), vec![10, 20, 30, 40]);
}

// G1: the root collects every rank's contribution, in relative-rank order.
#[test]
fn gather_binary_collects_in_rank_order() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let rank = ctx.rank_id();
        let contribution = rank as i32 * 2;
        let (collected, _ctx) = gather_binary::<i32, Blocking, BincodeBackend>(ctx, 0, contribution).wait();
        collected
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    let root_result = results.remove(0);
    assert_eq!(root_result, Some(vec![0, 2, 4, 6, 8]));
    assert!(results.into_iter().all(|r| r.is_none()));
}

#[test]
fn gather_binomial_collects_in_rank_order() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let rank = ctx.rank_id();
        let (collected, _ctx) = gather_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, rank as i32).wait();
        collected
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    let root_result = results.remove(0);
    assert_eq!(root_result, Some(vec![0, 1, 2, 3]));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// R1: binary reduce combines commutative contributions correctly at an
// arbitrary (non-power-of-two) rank count.
#[test]
fn reduce_binary_sums_contributions() {
    let guards = initialize(Configuration::Process(6), |ctx| {
        let rank = ctx.rank_id();
        let (total, _ctx) =
            reduce_binary::<i32, Blocking, BincodeBackend>(ctx, 0, [rank as i32], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some(15));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// R1 scenario verbatim: N=8, binary reduce of [1,2,3,4] per rank, op = +,
// init = 0. Expected 8*10 = 80 at root. Unlike the test above, every rank
// folds a multi-element local range rather than a single pre-folded value,
// exercising the library's own `fold(init, range, op)` step (§4.5) instead
// of leaving it to the caller.
#[test]
fn reduce_binary_r1_scenario() {
    let guards = initialize(Configuration::Process(8), |ctx| {
        let (total, _ctx) =
            reduce_binary::<i32, Blocking, BincodeBackend>(ctx, 0, [1, 2, 3, 4], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some(80));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// R1 (determinism): a non-commutative op still produces a single
// reproducible answer under the binary variant's fixed odd-before-even
// combination order.
#[test]
fn reduce_binary_combines_children_in_fixed_order() {
    let guards = initialize(Configuration::Process(3), |ctx| {
        let rank = ctx.rank_id();
        let value = match rank {
            0 => "a".to_string(),
            1 => "b".to_string(),
            2 => "c".to_string(),
            _ => unreachable!(),
        };
        let (result, _ctx) = reduce_binary::<String, Blocking, BincodeBackend>(
            ctx,
            0,
            [value],
            String::new(),
            |a, b| format!("{a}{b}"),
        )
        .wait();
        result
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    // Rank 0's children are 1 (odd slot, left) and 2 (even slot, right);
    // the fixed combination order is own, then odd child, then even child.
    assert_eq!(results.remove(0), Some("abc".to_string()));
}

// Binomial reduce over a commutative op at a power-of-two rank count.
#[test]
fn reduce_binomial_sums_contributions() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let rank = ctx.rank_id();
        let (total, _ctx) =
            reduce_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, [rank as i32], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some(6));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// R2: N=5 (non-power-of-two), binomial reduce of [rank], op = +, init = 0.
// Expected 10 — the rank-4 fold-in onto rank 0 must land before the
// power-of-two core exchange runs for the total to come out whole.
#[test]
fn reduce_binomial_sums_contributions_at_non_power_of_two() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let rank = ctx.rank_id();
        let (total, _ctx) =
            reduce_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, [rank as i32], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some(10));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// A wider rank count gives the binomial round schedule more rounds (4, for
// N=16) and more ranks racing to retire early, which is exactly the shape
// that would expose a missing per-round barrier as a livelock rather than a
// quick, lucky pass.
#[test]
fn reduce_binomial_sums_contributions_at_wider_power_of_two() {
    let guards = initialize(Configuration::Process(16), |ctx| {
        let rank = ctx.rank_id();
        let (total, _ctx) =
            reduce_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, [rank as i32], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some((0..16).sum()));
    assert!(results.into_iter().all(|r| r.is_none()));
}

#[test]
fn gather_binomial_collects_in_rank_order_at_wider_power_of_two() {
    let guards = initialize(Configuration::Process(16), |ctx| {
        let rank = ctx.rank_id();
        let (collected, _ctx) = gather_binomial::<i32, Blocking, BincodeBackend>(ctx, 0, rank as i32).wait();
        collected
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    let root_result = results.remove(0);
    assert_eq!(root_result, Some((0..16).collect::<Vec<i32>>()));
    assert!(results.into_iter().all(|r| r.is_none()));
}

// Universal property: nonblocking mode still finishes its own local
// send/receive exchange before returning (only the trailing barrier is
// skipped), so it yields the same answer as blocking mode once waited on.
#[test]
fn nonblocking_mode_yields_same_result_as_blocking() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let rank = ctx.rank_id();
        let (total, _ctx) =
            reduce_binary::<i32, Nonblocking, BincodeBackend>(ctx, 0, [rank as i32], 0, |a, b| a + b).wait();
        total
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    assert_eq!(results.remove(0), Some(6));
}

// Universal property: every collective in this crate resolves the root's
// *relative* rank 0 through the same rotation, so calling with any absolute
// root produces the same shape of answer — demonstrated here via gather.
#[test]
fn gather_binary_honors_arbitrary_root() {
    let guards = initialize(Configuration::Process(5), |ctx| {
        let rank = ctx.rank_id();
        let root = 2;
        let (collected, _ctx) = gather_binary::<i32, Blocking, BincodeBackend>(ctx, root, rank as i32).wait();
        (rank, collected)
    })
    .expect("failed to start runtime");

    let results = guards.join();
    let (_, root_result) = results.into_iter().find(|(rank, _)| *rank == 2).expect("root present");
    let mut collected = root_result.expect("root collects a value");
    collected.sort();
    assert_eq!(collected, vec![0, 1, 2, 3, 4]);
}

// Universal property: a single-rank world is a legal (trivial) topology for
// every collective.
#[test]
fn single_rank_broadcast_is_identity() {
    let guards = initialize(Configuration::Thread, |ctx| {
        let (value, _ctx) = broadcast_binary::<i32, Blocking, BincodeBackend>(ctx, 0, Some(7)).wait();
        value
    })
    .expect("failed to start runtime");

    assert_eq!(guards.join(), vec![7]);
}

// S1: N=4, binary scatter of [0,1,2,3,4,5,6,7] (B=2) from root 0, using
// `into_blocks` to turn the flat input range into per-rank segments the way
// a caller driving the §4.3 contract directly would.
#[test]
fn scatter_binary_s1_scenario() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let segments = (ctx.rank_id() == 0).then(|| into_blocks(&(0..8).collect::<Vec<i32>>(), 4));
        let (mine, ctx) = scatter_binary::<Vec<i32>, Blocking, BincodeBackend>(ctx, 0, segments).wait();
        (ctx.rank_id(), mine)
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    results.sort_by_key(|(rank, _)| *rank);
    let blocks: Vec<Vec<i32>> = results.into_iter().map(|(_, block)| block).collect();
    assert_eq!(blocks, vec![vec![0, 1], vec![2, 3], vec![4, 5], vec![6, 7]]);
}

// `into_blocks` resolves the §9 Open Question eagerly: an input length not
// divisible by the rank count panics rather than silently truncating.
#[test]
#[should_panic(expected = "not evenly divisible")]
fn into_blocks_rejects_uneven_input() {
    let _ = into_blocks(&[1, 2, 3, 4, 5], 3);
}

// G1: N=3 (non-power-of-two), binomial gather of [rank, rank+10] per rank
// to root 0, flattened back into the contract's concatenated-in-rank-order
// shape via `concat_blocks`.
#[test]
fn gather_binomial_g1_scenario() {
    let guards = initialize(Configuration::Process(3), |ctx| {
        let rank = ctx.rank_id();
        let block = vec![rank as i32, rank as i32 + 10];
        let (collected, _ctx) = gather_binomial::<Vec<i32>, Blocking, BincodeBackend>(ctx, 0, block).wait();
        collected
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    let root_result = results.remove(0).expect("root collects blocks");
    assert_eq!(concat_blocks(root_result), vec![0, 10, 1, 11, 2, 12]);
    assert!(results.into_iter().all(|r| r.is_none()));
}

// Universal property: gather is the inverse of scatter on the root's range,
// for a rotated (non-zero) root.
#[test]
fn gather_inverts_scatter_with_rotated_root() {
    let guards = initialize(Configuration::Process(4), |ctx| {
        let root = 1;
        let input: Vec<i32> = (0..8).collect();
        let segments = (ctx.rank_id() == root).then(|| into_blocks(&input, 4));
        let (mine, ctx) = scatter_binary::<Vec<i32>, Blocking, BincodeBackend>(ctx, root, segments).wait();
        let (collected, _ctx) = gather_binary::<Vec<i32>, Blocking, BincodeBackend>(ctx, root, mine).wait();
        collected
    })
    .expect("failed to start runtime");

    let mut results = guards.join();
    let root_result = results.remove(1).expect("root collects blocks");
    assert_eq!(concat_blocks(root_result), (0..8).collect::<Vec<i32>>());
}
