//! Binary-tree scatter of a root-held range, two elements per rank.

use collectives_core::{scatter_binary, BincodeBackend, Blocking};
use collectives_runtime::{initialize, Configuration};

fn main() {
    let config = Configuration::from_args(std::env::args().skip(1)).unwrap();
    let ranks = config.ranks();
    let guards = initialize(config, move |ctx| {
        let segments = (ctx.rank_id() == 0)
            .then(|| (0..ranks).map(|r| vec![2 * r, 2 * r + 1]).collect::<Vec<_>>());
        let (mine, ctx) = scatter_binary::<Vec<usize>, Blocking, BincodeBackend>(ctx, 0, segments).wait();
        println!("rank {}: received segment {:?}", ctx.rank_id(), mine);
        mine
    });

    match guards {
        Ok(guards) => {
            for result in guards.join() {
                println!("result: {result:?}");
            }
        }
        Err(e) => println!("error in computation: {e}"),
    }
}
