mod alloc;
mod arena;
mod map;
mod node;
mod pool;
#[cfg(test)]
mod proptests;
#[macro_use]
mod builder;
mod error;
mod opt;

// Public exports.
pub use error::AllocError;
pub use map::{HamtConfig, HamtMap, Iter, TreeStats};
pub use pool::PoolStats;
