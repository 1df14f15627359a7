//! Goal-distance heuristics.
//!
//! A [`HeuristicTable`] holds the exact obstacle-aware move distance from
//! every location to one goal, computed once by breadth-first search over the
//! [`Graph`].  It ignores other agents, so it never overestimates the cost of
//! a collision-free plan and is admissible for the search driver.
//!
//! Coordinators replan the same goals over and over; [`HeuristicCache`] keeps
//! one table per goal so each BFS runs once per run, not once per search.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use sipp_core::LocationId;

use crate::Graph;

/// Distance reported for locations that cannot reach the goal.
pub const UNREACHABLE: u32 = u32::MAX;

// ── HeuristicTable ────────────────────────────────────────────────────────────

/// Move distance to a fixed goal for every location.
#[derive(Clone, Debug)]
pub struct HeuristicTable {
    goal: LocationId,
    dist: Vec<u32>,
}

impl HeuristicTable {
    /// Breadth-first search outward from `goal`.
    ///
    /// Edges are followed in reverse, which is the same as forward for the
    /// symmetric grids this crate builds.  Time complexity: O(V + E).
    pub fn from_goal<G: Graph + ?Sized>(graph: &G, goal: LocationId) -> Self {
        let mut dist = vec![UNREACHABLE; graph.location_count()];
        let mut queue = VecDeque::new();

        dist[goal.index()] = 0;
        queue.push_back(goal);

        while let Some(loc) = queue.pop_front() {
            let next = dist[loc.index()] + 1;
            for &n in graph.neighbors(loc) {
                if dist[n.index()] == UNREACHABLE {
                    dist[n.index()] = next;
                    queue.push_back(n);
                }
            }
        }

        Self { goal, dist }
    }

    pub fn goal(&self) -> LocationId {
        self.goal
    }

    /// Distance from `location` to the goal, [`UNREACHABLE`] if disconnected.
    #[inline]
    pub fn get(&self, location: LocationId) -> u32 {
        self.dist[location.index()]
    }

    #[inline]
    pub fn is_reachable(&self, location: LocationId) -> bool {
        self.get(location) != UNREACHABLE
    }
}

// ── HeuristicCache ────────────────────────────────────────────────────────────

/// Lazily computed heuristic tables keyed by goal.
#[derive(Default)]
pub struct HeuristicCache {
    tables: FxHashMap<LocationId, HeuristicTable>,
}

impl HeuristicCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for `goal`, running the BFS on first request.
    pub fn get_or_compute<G: Graph + ?Sized>(&mut self, graph: &G, goal: LocationId) -> &HeuristicTable {
        self.tables.entry(goal).or_insert_with(|| {
            tracing::debug!(%goal, "computing heuristic table");
            HeuristicTable::from_goal(graph, goal)
        })
    }

    /// Cached table for `goal`, if any.
    pub fn get(&self, goal: LocationId) -> Option<&HeuristicTable> {
        self.tables.get(&goal)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
