//! `sipp-table` — the two data structures every single-agent search leans on.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`interval`] | `SafeInterval`                                               |
//! | [`table`]    | `SafeIntervalTable`: who owns which location, when           |
//! | [`node`]     | `SearchNode`, `NodeInit`, `NodeHandle`                       |
//! | [`pool`]     | `NodeMemoryPool`, `PoolConfig`, `Slot`                       |
//!
//! The two halves are independent: the table knows nothing about nodes and
//! the pool knows nothing about reservations.  The search driver in
//! `sipp-search` is the only code that uses both.
//!
//! # Failure model
//!
//! Both structures trust their caller.  A broken precondition (claiming an
//! owned interval, reading a dead node) is a bug upstream and ends in
//! [`sipp_core::raise`].  Ordinary negative answers ("no free interval here")
//! are `Option`s and empty vectors.

pub mod interval;
pub mod node;
pub mod pool;
pub mod table;

#[cfg(test)]
mod tests;

pub use interval::SafeInterval;
pub use node::{NodeHandle, NodeInit, SearchNode};
pub use pool::{DEFAULT_BLOCK_SIZE, NodeMemoryPool, PoolConfig, Slot};
pub use table::SafeIntervalTable;
