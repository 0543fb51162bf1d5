//! Binary-tree broadcast of a single integer from rank 0, run over whatever
//! rank count `-w` asks for. Analogous to `communication`'s `hello.rs`.

use collectives_core::{broadcast_binary, BincodeBackend, Blocking};
use collectives_runtime::{initialize, Configuration};

fn main() {
    let config = Configuration::from_args(std::env::args().skip(1)).unwrap();
    let guards = initialize(config, |ctx| {
        let value = (ctx.rank_id() == 0).then_some(42);
        let (value, ctx) = broadcast_binary::<i32, Blocking, BincodeBackend>(ctx, 0, value).wait();
        println!("rank {}: broadcast value {}", ctx.rank_id(), value);
        value
    });

    match guards {
        Ok(guards) => {
            for result in guards.join() {
                println!("result: {result}");
            }
        }
        Err(e) => println!("error in computation: {e}"),
    }
}
