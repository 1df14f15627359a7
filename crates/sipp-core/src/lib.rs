//! `sipp-core` — foundational types for the safe-interval planning core.
//!
//! This crate is a dependency of every other `sipp-*` crate.  It has no
//! `sipp-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `tracing`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                |
//! |-----------------|---------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `LocationId`, `NodeId`, `NO_AGENT`           |
//! | [`time`]        | `Timestep`, `MAX_TIMESTEP`                              |
//! | [`path`]        | `PathEntry`, `Path`, run decomposition                  |
//! | [`rng`]         | `TieBreakRng` (seedable, injected into searches)        |
//! | [`violation`]   | `InvariantViolation`, [`raise`]                         |
//! | [`error`]       | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, timesteps, paths.   |

pub mod error;
pub mod ids;
pub mod path;
pub mod rng;
pub mod time;
pub mod violation;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{AgentId, LocationId, NO_AGENT, NodeId};
pub use path::{Path, PathEntry, Run, path_from_locations, runs};
pub use rng::TieBreakRng;
pub use time::{MAX_TIMESTEP, Timestep};
pub use violation::{InvariantViolation, raise};
