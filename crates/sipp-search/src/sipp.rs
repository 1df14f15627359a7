//! `SippSearch` — focal safe-interval path planning for one agent.
//!
//! # State space
//!
//! A node is "at location `l`, inside free interval `I`, since time `t`".
//! Waiting is implicit: from a node the agent may stay at `l` until
//! `I.high - 1` and then step to a neighbour, so one expansion covers every
//! departure time at once.  The reservation table answers which intervals
//! next door are enterable; the arrival time into interval `J` is
//! `max(t + 1, J.low)`.
//!
//! # Node identity
//!
//! Each (location, interval) pair maps to one pool slot:
//!
//! ```text
//! id = location * slots + ordinal(interval)
//! ```
//!
//! so the pool doubles as the closed/duplicate-detection table and no hash
//! map is needed.  `slots` starts at `config.slots_per_location` and is
//! raised (with a fresh pool) whenever a table holds more intervals at one
//! location, so every ordinal has a slot.  The table is borrowed immutably for the whole search, so
//! ordinals cannot shift under it.
//!
//! # Ordering
//!
//! OPEN is ordered by `f`, then `h`, then a random key; FOCAL holds open
//! nodes with `f <= w * f_min`, ordered by soft conflicts first.

use sipp_core::{
    AgentId, CoreError, InvariantViolation, LocationId, NodeId, Path, PathEntry, TieBreakRng,
    Timestep, raise,
};
use sipp_map::{Graph, HeuristicTable, UNREACHABLE};
use sipp_table::{NodeInit, NodeMemoryPool, SafeInterval, SafeIntervalTable, SearchNode};

use crate::lists::FocalLists;
use crate::{ConflictOracle, GoalPolicy, SearchConfig, SearchError, SearchResult, SearchStats};

// ── Request / outcome ─────────────────────────────────────────────────────────

/// One agent's planning query.  The goal is the heuristic's goal.
#[derive(Copy, Clone, Debug)]
pub struct SearchRequest<'h> {
    pub agent:      AgentId,
    pub start:      LocationId,
    pub start_time: Timestep,
    pub heuristic:  &'h HeuristicTable,
}

impl SearchRequest<'_> {
    pub fn goal(&self) -> LocationId {
        self.heuristic.goal()
    }
}

/// A successful search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// `path[i]` is the agent's location at `start_time + i`, waits included.
    pub path:       Path,
    pub start_time: Timestep,
    /// Timesteps from `start_time` to arrival at the goal.
    pub cost:       u32,
    /// Soft conflicts along `path`.
    pub conflicts:  u32,
    pub stats:      SearchStats,
}

impl SearchOutcome {
    /// Timestep of the last path entry.
    pub fn end_time(&self) -> Timestep {
        self.start_time + self.cost
    }

    /// Replace `history` from `start_time` on with this plan, giving a path
    /// indexed by absolute timestep (the form the reservation table takes).
    pub fn splice_onto(&self, history: &mut Path) -> SearchResult<()> {
        let at = self.start_time.index();
        if history.len() < at {
            return Err(SearchError::HistoryTooShort { len: history.len(), start_time: self.start_time });
        }
        history.truncate(at);
        history.extend_from_slice(&self.path);
        Ok(())
    }
}

// ── SippSearch ────────────────────────────────────────────────────────────────

/// Reusable single-agent planner bound to one map.
///
/// Owns its node pool and lists; every [`find_path`](Self::find_path) call
/// resets them in O(1) (pool epoch bump) rather than reallocating.
pub struct SippSearch<'g, G: Graph> {
    graph:       &'g G,
    config:      SearchConfig,
    pool:        NodeMemoryPool,
    slots:       usize,
    lists:       FocalLists,
    stats:       SearchStats,
    accumulated: SearchStats,
    runs:        u64,
}

impl<'g, G: Graph> SippSearch<'g, G> {
    pub fn new(graph: &'g G, config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;
        let pool = NodeMemoryPool::for_map(graph.location_count(), config.slots_per_location)?;
        Ok(Self {
            graph,
            slots: config.slots_per_location,
            config,
            pool,
            lists: FocalLists::new(),
            stats: SearchStats::default(),
            accumulated: SearchStats::default(),
            runs: 0,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Counters of the most recent search.
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Counters summed over every search run so far.
    pub fn accumulated(&self) -> SearchStats {
        self.accumulated
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn pool(&self) -> &NodeMemoryPool {
        &self.pool
    }

    /// Pool slots per location currently in use.
    pub fn slots_per_location(&self) -> usize {
        self.slots
    }

    /// Plan with the tie-break stream derived from `config.seed` and the agent.
    pub fn find_path<O: ConflictOracle + ?Sized>(
        &mut self,
        table:   &SafeIntervalTable,
        request: &SearchRequest<'_>,
        oracle:  &O,
    ) -> SearchResult<SearchOutcome> {
        let mut rng = TieBreakRng::for_agent(self.config.seed, request.agent);
        self.find_path_with_rng(table, request, oracle, &mut rng)
    }

    /// Plan with an explicit tie-break stream.
    pub fn find_path_with_rng<O: ConflictOracle + ?Sized>(
        &mut self,
        table:   &SafeIntervalTable,
        request: &SearchRequest<'_>,
        oracle:  &O,
        rng:     &mut TieBreakRng,
    ) -> SearchResult<SearchOutcome> {
        self.pool.reset();
        self.lists.clear();
        self.stats = SearchStats::default();

        let result = self.search(table, request, oracle, rng);

        self.accumulated += self.stats;
        self.runs += 1;
        match &result {
            Ok(outcome) => tracing::debug!(
                agent = %request.agent,
                cost = outcome.cost,
                conflicts = outcome.conflicts,
                expanded = self.stats.expanded,
                generated = self.stats.generated,
                "search succeeded"
            ),
            Err(e) => tracing::debug!(
                agent = %request.agent,
                expanded = self.stats.expanded,
                generated = self.stats.generated,
                error = %e,
                "search failed"
            ),
        }
        result
    }

    fn search<O: ConflictOracle + ?Sized>(
        &mut self,
        table:   &SafeIntervalTable,
        request: &SearchRequest<'_>,
        oracle:  &O,
        rng:     &mut TieBreakRng,
    ) -> SearchResult<SearchOutcome> {
        let SearchRequest { agent, start, start_time, heuristic } = *request;
        let goal = heuristic.goal();
        let map_size = self.graph.location_count();
        if table.map_size() != map_size {
            return Err(SearchError::Config(format!(
                "reservation table covers {} locations, map has {map_size}",
                table.map_size()
            )));
        }
        for location in [start, goal] {
            if location.index() >= map_size {
                return Err(CoreError::LocationOutOfBounds { location, map_size }.into());
            }
        }
        self.fit_pool(table)?;
        tracing::debug!(%agent, %start, %goal, %start_time, "search started");

        let h = heuristic.get(start);
        if h == UNREACHABLE {
            return Err(SearchError::NoPath { agent, start, goal });
        }
        let Some(interval) = table.first_free_interval(start, start_time) else {
            return Err(SearchError::StartBlocked { agent, location: start, timestep: start_time });
        };

        let id = self.node_id(table, start, interval);
        self.pool.generate_node(id, NodeInit {
            location: start,
            g: 0,
            h,
            parent: None,
            timestep: start_time,
            interval,
            conflicts: 0,
            tie: rng.next_key(),
        });
        self.stats.generated += 1;
        self.push(id);

        while let Some(id) = self.lists.pop(&self.pool, &self.config) {
            self.pool.get_node_mut(id).in_open = false;
            self.pool.close_node(id);
            self.stats.expanded += 1;

            let node = self.pool.get_node(id).clone();
            if self.is_terminal(&node, goal) {
                return Ok(self.outcome(id, start_time));
            }
            self.expand(table, request, id, &node, oracle, rng);
        }

        Err(SearchError::NoPath { agent, start, goal })
    }

    // ── Expansion ─────────────────────────────────────────────────────────

    fn is_terminal(&self, node: &SearchNode, goal: LocationId) -> bool {
        node.location == goal
            && match self.config.goal_policy {
                GoalPolicy::RequireClear => node.interval.is_unbounded(),
                GoalPolicy::AcceptArrival => true,
            }
    }

    fn expand<O: ConflictOracle + ?Sized>(
        &mut self,
        table:     &SafeIntervalTable,
        request:   &SearchRequest<'_>,
        parent_id: NodeId,
        parent:    &SearchNode,
        oracle:    &O,
        rng:       &mut TieBreakRng,
    ) {
        let graph = self.graph;
        let agent = request.agent;
        let parent_handle = self.pool.handle(parent_id);
        let lower = parent.timestep.next();

        for &to in graph.neighbors(parent.location) {
            let h = request.heuristic.get(to);
            if h == UNREACHABLE {
                continue;
            }
            for interval in table.reachable_intervals(parent.location, parent.interval, lower, to) {
                let arrival = lower.max(interval.low);
                let g = arrival - request.start_time;
                if self.config.depth_limit.is_some_and(|limit| g > limit) {
                    continue;
                }
                let conflicts = parent.conflicts
                    + oracle.wait_conflicts(agent, parent.location, lower, arrival)
                    + oracle.edge_conflicts(agent, parent.location, to, arrival)
                    + oracle.vertex_conflicts(agent, to, arrival);

                let candidate = NodeInit {
                    location: to,
                    g,
                    h,
                    parent: Some(parent_handle),
                    timestep: arrival,
                    interval,
                    conflicts,
                    tie: rng.next_key(),
                };
                let id = self.node_id(table, to, interval);
                if self.pool.has_node(id) {
                    self.relax(id, candidate);
                } else {
                    self.pool.generate_node(id, candidate);
                    self.stats.generated += 1;
                    self.push(id);
                }
            }
        }
    }

    /// Replace the node at `id` with `candidate` if the candidate reaches
    /// the same state cheaper or with fewer soft conflicts.
    fn relax(&mut self, id: NodeId, candidate: NodeInit) {
        let existing = self.pool.get_node(id);
        if candidate.g >= existing.g && candidate.conflicts >= existing.conflicts {
            return;
        }
        if existing.in_open {
            self.lists.remove(id, existing);
        }
        if existing.closed {
            self.stats.reopened += 1;
        }

        let node = self.pool.get_node_mut(id);
        node.g = candidate.g;
        node.h = candidate.h;
        node.parent = candidate.parent;
        node.timestep = candidate.timestep;
        node.interval = candidate.interval;
        node.conflicts = candidate.conflicts;
        node.tie = candidate.tie;
        node.closed = false;
        self.push(id);
    }

    fn push(&mut self, id: NodeId) {
        let node = self.pool.get_node_mut(id);
        node.in_open = true;
        self.lists.push(id, node, &self.config);
    }

    /// Rebuild the pool with more slots per location if `table` has a
    /// location with more intervals than the pool can address.
    fn fit_pool(&mut self, table: &SafeIntervalTable) -> SearchResult<()> {
        let needed = table.max_intervals();
        if needed <= self.slots {
            return Ok(());
        }
        let slots = needed.next_power_of_two();
        self.pool = NodeMemoryPool::for_map(self.graph.location_count(), slots)?;
        tracing::debug!(old = self.slots, new = slots, needed, "node pool resized");
        self.slots = slots;
        Ok(())
    }

    fn node_id(&self, table: &SafeIntervalTable, location: LocationId, interval: SafeInterval) -> NodeId {
        let slots = self.slots;
        let ordinal = table.interval_ordinal(location, interval.low);
        if ordinal >= slots {
            raise(InvariantViolation::SlotsPerLocationExceeded { location, ordinal, slots });
        }
        NodeId((location.index() * slots + ordinal) as u32)
    }

    // ── Reconstruction ────────────────────────────────────────────────────

    fn outcome(&self, terminal: NodeId, start_time: Timestep) -> SearchOutcome {
        let mut chain = Vec::new();
        let mut current = self.pool.get_node(terminal);
        loop {
            chain.push((current.location, current.timestep));
            match current.parent {
                Some(parent) => current = self.pool.node(parent),
                None => break,
            }
        }
        chain.reverse();

        let mut path = Vec::new();
        for pair in chain.windows(2) {
            let ((location, from), (_, until)) = (pair[0], pair[1]);
            path.extend((from.0..until.0).map(|_| PathEntry::new(location)));
        }
        if let Some(&(location, _)) = chain.last() {
            path.push(PathEntry::new(location));
        }

        let node = self.pool.get_node(terminal);
        tracing::trace!(
            open = self.lists.open_len(),
            focal = self.lists.focal_len(),
            len = path.len(),
            "path reconstructed"
        );
        SearchOutcome {
            path,
            start_time,
            cost: node.g,
            conflicts: node.conflicts,
            stats: self.stats,
        }
    }
}
