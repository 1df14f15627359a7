//! The safe interval: one cell of a location's time partition.

use std::fmt;

use sipp_core::{AgentId, MAX_TIMESTEP, NO_AGENT, Timestep};

/// Half-open time range `[low, high)` at one location, either free
/// (`owner == NO_AGENT`) or exclusively owned by `owner`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafeInterval {
    pub low:   Timestep,
    pub high:  Timestep,
    pub owner: AgentId,
}

impl SafeInterval {
    /// The whole timeline, unowned.  Every location starts as this.
    pub const UNBOUNDED: SafeInterval = SafeInterval {
        low:   Timestep::ZERO,
        high:  MAX_TIMESTEP,
        owner: NO_AGENT,
    };

    #[inline]
    pub fn free(low: Timestep, high: Timestep) -> Self {
        Self { low, high, owner: NO_AGENT }
    }

    #[inline]
    pub fn owned(low: Timestep, high: Timestep, owner: AgentId) -> Self {
        Self { low, high, owner }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.owner == NO_AGENT
    }

    #[inline]
    pub fn contains(&self, t: Timestep) -> bool {
        self.low <= t && t < self.high
    }

    /// Number of timesteps covered.
    #[inline]
    pub fn len(&self) -> u32 {
        self.high - self.low
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.high <= self.low
    }

    /// `true` if this interval runs to the end of time.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.high.is_unbounded()
    }
}

impl fmt::Display for SafeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            write!(f, "[{},{}):FREE", self.low, self.high)
        } else {
            write!(f, "[{},{}):{}", self.low, self.high, self.owner.0)
        }
    }
}
