//! Search nodes and the checked handles that link them.

use std::fmt;

use sipp_core::{LocationId, NodeId, Timestep};

use crate::SafeInterval;

// ── NodeHandle ────────────────────────────────────────────────────────────────

/// Checked reference to a node in a [`NodeMemoryPool`](crate::NodeMemoryPool).
///
/// Carries the pool epoch it was issued in.  Resolving it after the pool has
/// been [`reset`](crate::NodeMemoryPool::reset) is an
/// [`InvariantViolation::StaleHandle`](sipp_core::InvariantViolation::StaleHandle),
/// never a silent read of another search's node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeHandle {
    pub(crate) id:    NodeId,
    pub(crate) epoch: u32,
}

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The pool epoch this handle was issued in.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.epoch)
    }
}

// ── SearchNode ────────────────────────────────────────────────────────────────

/// One state of the time-expanded search: "at `location`, inside `interval`,
/// since `timestep`".
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub location:  LocationId,
    /// Cost so far (timesteps since the search started).
    pub g:         u32,
    /// Admissible estimate of the remaining cost.
    pub h:         u32,
    /// Back-link for path reconstruction only.
    pub parent:    Option<NodeHandle>,
    /// Earliest arrival into `interval`.
    pub timestep:  Timestep,
    /// The safe interval this node occupies at `location`.
    pub interval:  SafeInterval,
    /// Soft conflicts with other agents' paths accumulated along the way.
    pub conflicts: u32,
    pub closed:    bool,
    /// `true` while the node has entries in the open (and maybe focal) list.
    pub in_open:   bool,
    /// Random tie-break key.  Together with `f`, `h`, and `conflicts` it
    /// rebuilds the node's open/focal keys, so no heap handles are stored.
    pub tie:       u64,
}

impl SearchNode {
    /// `g + h`, saturating for unreachable estimates.
    #[inline]
    pub fn f(&self) -> u32 {
        self.g.saturating_add(self.h)
    }
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            location:  LocationId::INVALID,
            g:         0,
            h:         0,
            parent:    None,
            timestep:  Timestep::ZERO,
            interval:  SafeInterval::UNBOUNDED,
            conflicts: 0,
            closed:    false,
            in_open:   false,
            tie:       0,
        }
    }
}

/// Everything needed to materialise a node with
/// [`NodeMemoryPool::generate_node`](crate::NodeMemoryPool::generate_node).
#[derive(Clone, Debug)]
pub struct NodeInit {
    pub location:  LocationId,
    pub g:         u32,
    pub h:         u32,
    pub parent:    Option<NodeHandle>,
    pub timestep:  Timestep,
    pub interval:  SafeInterval,
    pub conflicts: u32,
    pub tie:       u64,
}

impl From<NodeInit> for SearchNode {
    fn from(init: NodeInit) -> Self {
        Self {
            location:  init.location,
            g:         init.g,
            h:         init.h,
            parent:    init.parent,
            timestep:  init.timestep,
            interval:  init.interval,
            conflicts: init.conflicts,
            closed:    false,
            in_open:   false,
            tie:       init.tie,
        }
    }
}
