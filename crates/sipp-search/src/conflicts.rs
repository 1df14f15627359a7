//! Soft conflicts: collisions with paths that are known but not reserved.
//!
//! The reservation table holds hard constraints; a search never enters an
//! owned interval.  Paths of agents that are planned but not yet committed
//! are soft constraints instead.  The search may cross them, but FOCAL
//! prefers nodes that cross them less often.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use sipp_core::{AgentId, LocationId, PathEntry, Timestep};

/// Counts soft conflicts for the moves a search considers.
///
/// `Sync` so one oracle can serve parallel searches.
pub trait ConflictOracle: Sync {
    /// Other agents at `location` at time `t`.
    fn vertex_conflicts(&self, agent: AgentId, location: LocationId, t: Timestep) -> u32;

    /// Other agents traversing `to → from` while `agent` moves `from → to`,
    /// arriving at `arrival`.
    fn edge_conflicts(&self, agent: AgentId, from: LocationId, to: LocationId, arrival: Timestep) -> u32;

    /// Vertex conflicts summed over waiting at `location` for `[from, until)`.
    fn wait_conflicts(&self, agent: AgentId, location: LocationId, from: Timestep, until: Timestep) -> u32 {
        (from.0..until.0).map(|t| self.vertex_conflicts(agent, location, Timestep(t))).sum()
    }
}

/// Oracle for searches with nothing to avoid.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoSoftConflicts;

impl ConflictOracle for NoSoftConflicts {
    fn vertex_conflicts(&self, _: AgentId, _: LocationId, _: Timestep) -> u32 {
        0
    }

    fn edge_conflicts(&self, _: AgentId, _: LocationId, _: LocationId, _: Timestep) -> u32 {
        0
    }

    fn wait_conflicts(&self, _: AgentId, _: LocationId, _: Timestep, _: Timestep) -> u32 {
        0
    }
}

// ── SoftPathTable ─────────────────────────────────────────────────────────────

struct SoftPath {
    start: Timestep,
    path:  Vec<PathEntry>,
}

impl SoftPath {
    fn location_at(&self, t: Timestep) -> Option<LocationId> {
        if t < self.start {
            return None;
        }
        self.path.get((t - self.start) as usize).map(|e| e.location)
    }
}

/// Occupancy index of other agents' uncommitted paths.
///
/// Paths are finite: an agent is not counted after its last entry.
#[derive(Default)]
pub struct SoftPathTable {
    paths:     FxHashMap<AgentId, SoftPath>,
    occupancy: FxHashMap<LocationId, BTreeMap<Timestep, Vec<AgentId>>>,
}

impl SoftPathTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Record `path` for `agent`, with `path[0]` at time `start`.  Replaces
    /// any earlier path of the same agent.
    pub fn insert(&mut self, agent: AgentId, path: &[PathEntry], start: Timestep) {
        self.remove(agent);
        for (offset, entry) in path.iter().enumerate() {
            let t = start + offset as u32;
            self.occupancy.entry(entry.location).or_default().entry(t).or_default().push(agent);
        }
        self.paths.insert(agent, SoftPath { start, path: path.to_vec() });
    }

    /// Forget `agent`'s path.  No-op if it has none.
    pub fn remove(&mut self, agent: AgentId) {
        let Some(old) = self.paths.remove(&agent) else {
            return;
        };
        for (offset, entry) in old.path.iter().enumerate() {
            let t = old.start + offset as u32;
            let Some(times) = self.occupancy.get_mut(&entry.location) else {
                continue;
            };
            if let Some(agents) = times.get_mut(&t) {
                agents.retain(|&a| a != agent);
                if agents.is_empty() {
                    times.remove(&t);
                }
            }
            if times.is_empty() {
                self.occupancy.remove(&entry.location);
            }
        }
    }

    fn others(agents: &[AgentId], agent: AgentId) -> u32 {
        agents.iter().filter(|&&a| a != agent).count() as u32
    }
}

impl ConflictOracle for SoftPathTable {
    fn vertex_conflicts(&self, agent: AgentId, location: LocationId, t: Timestep) -> u32 {
        self.occupancy
            .get(&location)
            .and_then(|times| times.get(&t))
            .map_or(0, |agents| Self::others(agents, agent))
    }

    fn edge_conflicts(&self, agent: AgentId, from: LocationId, to: LocationId, arrival: Timestep) -> u32 {
        if arrival == Timestep::ZERO {
            return 0;
        }
        let departure = Timestep(arrival.0 - 1);
        let Some(at_to) = self.occupancy.get(&to).and_then(|times| times.get(&departure)) else {
            return 0;
        };
        at_to
            .iter()
            .filter(|&&other| {
                other != agent
                    && self
                        .paths
                        .get(&other)
                        .and_then(|p| p.location_at(arrival))
                        .is_some_and(|l| l == from)
            })
            .count() as u32
    }

    fn wait_conflicts(&self, agent: AgentId, location: LocationId, from: Timestep, until: Timestep) -> u32 {
        if from >= until {
            return 0;
        }
        self.occupancy.get(&location).map_or(0, |times| {
            times.range(from..until).map(|(_, agents)| Self::others(agents, agent)).sum()
        })
    }
}
