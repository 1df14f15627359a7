//! Per-timestep agent paths.
//!
//! A [`Path`] is indexed by absolute timestep: `path[t].location` is where the
//! agent stands at time `t`.  Reservation code never looks at individual
//! entries; it works on [`Run`]s, the maximal stretches of consecutive
//! timesteps spent at one location.

use crate::{LocationId, Timestep};

/// One timestep of a path.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathEntry {
    pub location: LocationId,
}

impl PathEntry {
    #[inline]
    pub fn new(location: LocationId) -> Self {
        Self { location }
    }
}

/// Ordered per-timestep locations of one agent.
pub type Path = Vec<PathEntry>;

/// Build a path from raw location indices (test and scenario convenience).
pub fn path_from_locations(locations: &[u32]) -> Path {
    locations
        .iter()
        .map(|&l| PathEntry::new(LocationId(l)))
        .collect()
}

// ── Runs ──────────────────────────────────────────────────────────────────────

/// A maximal stay at one location: the agent is at `location` for every
/// timestep in `[low, high)`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Run {
    pub location: LocationId,
    pub low:      Timestep,
    pub high:     Timestep,
}

impl Run {
    /// Number of timesteps covered.
    #[inline]
    pub fn len(&self) -> u32 {
        self.high - self.low
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.high <= self.low
    }

    /// `true` if `t` falls inside `[low, high)`.
    #[inline]
    pub fn contains(&self, t: Timestep) -> bool {
        self.low <= t && t < self.high
    }
}

/// Split `path[start..end]` into maximal same-location runs.
///
/// `end` is clamped to `path.len()`; an empty range yields no runs.
pub fn runs(path: &[PathEntry], start: usize, end: usize) -> Vec<Run> {
    let end = end.min(path.len());
    let mut out = Vec::new();
    if start >= end {
        return out;
    }

    let mut run_low = start;
    for t in start + 1..end {
        if path[t].location != path[run_low].location {
            out.push(Run {
                location: path[run_low].location,
                low:      Timestep::from(run_low),
                high:     Timestep::from(t),
            });
            run_low = t;
        }
    }
    out.push(Run {
        location: path[run_low].location,
        low:      Timestep::from(run_low),
        high:     Timestep::from(end),
    });
    out
}
