//! Binary-tree reduce summing each rank's id at rank 0. Each rank folds its
//! own one-element local range (`[rank]`) against `init = 0` before the tree
//! combines the per-rank totals.

use collectives_core::{reduce_binary, BincodeBackend, Blocking};
use collectives_runtime::{initialize, Configuration};

fn main() {
    let config = Configuration::from_args(std::env::args().skip(1)).unwrap();
    let guards = initialize(config, |ctx| {
        let contribution = ctx.rank_id() as i64;
        let (total, ctx) =
            reduce_binary::<i64, Blocking, BincodeBackend>(ctx, 0, [contribution], 0, |a, b| a + b).wait();
        if let Some(total) = total {
            println!("rank {}: total is {}", ctx.rank_id(), total);
        }
        total
    });

    match guards {
        Ok(guards) => {
            for result in guards.join().into_iter().flatten() {
                println!("result: {result}");
            }
        }
        Err(e) => println!("error in computation: {e}"),
    }
}
