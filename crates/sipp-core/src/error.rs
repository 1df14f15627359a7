//! Recoverable error type shared by the `sipp-*` crates.
//!
//! Only *normal* failures live here (bad configuration, out-of-range input
//! from outside the core).  Broken internal invariants are not errors; see
//! [`crate::violation`].

use thiserror::Error;

use crate::LocationId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("location {location} outside map of {map_size} locations")]
    LocationOutOfBounds { location: LocationId, map_size: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `sipp-core`.
pub type CoreResult<T> = Result<T, CoreError>;
