//! Tree-topology collective operations: broadcast, scatter, gather, reduce,
//! each in a binary-tree and a binomial-tree variant, over the
//! [`collectives_runtime`] active-message adapter.
//!
//! Every operation is generic over a completion [`policy::Mode`] (blocking
//! or nonblocking) and a wire [`wire::Serialization`] backend, the same way
//! the source selects these at compile time via template parameters rather
//! than runtime branches.

pub mod broadcast;
pub mod gather;
pub mod policy;
pub mod reduce;
pub mod scatter;
pub mod topology;
pub mod wire;

pub use policy::{Blocking, Completion, Mode, Nonblocking};
pub use wire::{BincodeBackend, Serialization};

pub use broadcast::{broadcast_binary, broadcast_binomial};
pub use gather::{concat_blocks, gather_binary, gather_binomial};
pub use reduce::{reduce_binary, reduce_binomial};
pub use scatter::{into_blocks, scatter_binary, scatter_binomial};
