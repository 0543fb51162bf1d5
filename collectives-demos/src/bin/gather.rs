//! Binary-tree gather of one value per rank, collected at rank 0 in rank order.

use collectives_core::{gather_binary, BincodeBackend, Blocking};
use collectives_runtime::{initialize, Configuration};

fn main() {
    let config = Configuration::from_args(std::env::args().skip(1)).unwrap();
    let guards = initialize(config, |ctx| {
        let contribution = ctx.rank_id() as i32 * 10;
        let (collected, ctx) = gather_binary::<i32, Blocking, BincodeBackend>(ctx, 0, contribution).wait();
        if let Some(values) = &collected {
            println!("rank {}: gathered {:?}", ctx.rank_id(), values);
        }
        collected
    });

    match guards {
        Ok(guards) => {
            for result in guards.join().into_iter().flatten() {
                println!("result: {result:?}");
            }
        }
        Err(e) => println!("error in computation: {e}"),
    }
}
