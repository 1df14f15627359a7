//! `sipp-map` — the map contract consumed by the search driver.
//!
//! The reservation table never looks at adjacency; only the search driver
//! does, through the [`Graph`] trait.  This crate provides that trait, a
//! compact 4-connected grid implementation, and goal-distance heuristics.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`grid`]      | `Graph` trait, `GridMap` (CSR), `GridMapBuilder`          |
//! | [`heuristic`] | `HeuristicTable` (BFS), `HeuristicCache`                  |
//! | [`error`]     | `MapError`, `MapResult<T>`                                |

pub mod error;
pub mod grid;
pub mod heuristic;


pub use error::{MapError, MapResult};
pub use grid::{Graph, GridMap, GridMapBuilder};
pub use heuristic::{HeuristicCache, HeuristicTable, UNREACHABLE};
