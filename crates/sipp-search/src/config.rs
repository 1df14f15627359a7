//! Search configuration.

use crate::{SearchError, SearchResult};

/// When a node at the goal location ends the search.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GoalPolicy {
    /// Only if the agent can stay at the goal forever: the node's safe
    /// interval runs to `MAX_TIMESTEP`.  Use before `reserve_goal`.
    #[default]
    RequireClear,
    /// As soon as the goal is reached, whatever happens there later.
    /// Suits windowed planning where the goal is not parked on.
    AcceptArrival,
}

/// Per-search tuning.  Cheap to clone; one per [`SippSearch`](crate::SippSearch).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Focal suboptimality bound `w`: FOCAL holds open nodes with
    /// `f <= w * f_min`.  `1.0` gives plain best-first order with conflict
    /// count as the first tie-break.
    pub suboptimality: f64,

    pub goal_policy: GoalPolicy,

    /// Longest path cost (in timesteps) the search may produce.  `None` is
    /// unbounded.
    pub depth_limit: Option<u32>,

    /// Initial pool slots per location.  A search against a table with more
    /// intervals at one location rebuilds the pool with enough slots.
    pub slots_per_location: usize,

    /// Base seed for tie-breaking; mixed with the agent id per search.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            suboptimality:      1.0,
            goal_policy:        GoalPolicy::RequireClear,
            depth_limit:        None,
            slots_per_location: 16,
            seed:               0,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> SearchResult<()> {
        if !self.suboptimality.is_finite() || self.suboptimality < 1.0 {
            return Err(SearchError::Config(format!(
                "suboptimality must be a finite value >= 1, got {}",
                self.suboptimality
            )));
        }
        if self.slots_per_location == 0 {
            return Err(SearchError::Config("slots_per_location must be positive".into()));
        }
        Ok(())
    }

    /// The FOCAL admission bound for a given minimum `f`.
    #[inline]
    pub(crate) fn focal_bound(&self, min_f: u32) -> u32 {
        let bound = (min_f as f64 * self.suboptimality).floor();
        if bound >= u32::MAX as f64 { u32::MAX } else { bound as u32 }
    }
}
