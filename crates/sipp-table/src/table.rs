//! `SafeIntervalTable` — the global "who is where, when" reservation state.
//!
//! # Data layout
//!
//! One ordered map per location, keyed by interval `low`:
//!
//! ```text
//! partitions[loc] : BTreeMap<Timestep, SafeInterval>
//!   0 → [0,5):FREE   5 → [5,10):A7   10 → [10,MAX):FREE
//! ```
//!
//! Each map is a total partition of `[0, MAX_TIMESTEP)`: sorted, contiguous,
//! starting at 0 and ending at `MAX_TIMESTEP`, with no two neighbours sharing
//! an owner.  The lookup "which interval covers `t`" is
//! `range(..=t).next_back()`, O(log k) for k intervals.
//!
//! Locations are materialised lazily.  An empty map *means* one free
//! `[0, MAX_TIMESTEP)` interval; read queries answer from that virtual
//! interval without touching the map, so queries take `&self` and a single
//! table can serve many concurrent searches.  The first mutation of a
//! location inserts the real interval and records the location in `touched`
//! so [`clear`](SafeIntervalTable::clear) costs O(touched), not O(map).
//!
//! # Mutation primitives
//!
//! | Primitive  | Effect                                                        |
//! |------------|---------------------------------------------------------------|
//! | `split`    | carve an owned range out of one free interval                 |
//! | `merge`    | give an owned range back, coalescing with free neighbours     |
//! | `truncate` | give back everything from `t` to the end of an owned interval |
//!
//! All three preserve both partition invariants.  Anything that would break
//! them is an [`InvariantViolation`].

use std::collections::BTreeMap;

use sipp_core::{
    AgentId, InvariantViolation, LocationId, MAX_TIMESTEP, NO_AGENT, PathEntry, Timestep, raise,
    runs,
};

use crate::SafeInterval;

type Partition = BTreeMap<Timestep, SafeInterval>;

/// Per-location safe-interval partitions for every location on the map.
pub struct SafeIntervalTable {
    partitions: Vec<Partition>,
    /// Locations whose partition has been materialised, in first-touch order.
    touched:    Vec<LocationId>,
}

impl SafeIntervalTable {
    /// Table for a map of `map_size` locations, every location free forever.
    pub fn new(map_size: usize) -> Self {
        Self {
            partitions: vec![Partition::new(); map_size],
            touched:    Vec::new(),
        }
    }

    pub fn map_size(&self) -> usize {
        self.partitions.len()
    }

    /// Locations that currently hold a materialised partition.
    pub fn touched_locations(&self) -> &[LocationId] {
        &self.touched
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The interval covering `t` at `location`.
    ///
    /// `t` must be before [`MAX_TIMESTEP`].
    pub fn interval_at(&self, location: LocationId, t: Timestep) -> SafeInterval {
        if t.is_unbounded() {
            raise(InvariantViolation::MalformedRange {
                agent: NO_AGENT,
                location,
                low:   t,
                high:  t,
            });
        }
        let partition = self.partition(location);
        if partition.is_empty() {
            return SafeInterval::UNBOUNDED;
        }
        match partition.range(..=t).next_back() {
            Some((_, interval)) => *interval,
            None => raise(InvariantViolation::PartitionBroken {
                location,
                detail: format!("no interval covers {t}"),
            }),
        }
    }

    /// The interval covering `start_time`, if it is free.
    ///
    /// `None` means a search must not place a node at `location` at
    /// `start_time`: another agent owns it (or the time is past the horizon).
    pub fn first_free_interval(&self, location: LocationId, start_time: Timestep) -> Option<SafeInterval> {
        if start_time.is_unbounded() {
            return None;
        }
        let interval = self.interval_at(location, start_time);
        interval.is_free().then_some(interval)
    }

    /// `true` if nobody reserves `location` at or after `timestep`.
    ///
    /// Equivalently, the last interval is free and starts no later than
    /// `timestep`.  This is the precondition of [`reserve_goal`](Self::reserve_goal).
    pub fn is_location_clear(&self, location: LocationId, timestep: Timestep) -> bool {
        let last = self
            .partition(location)
            .values()
            .next_back()
            .copied()
            .unwrap_or(SafeInterval::UNBOUNDED);
        last.is_free() && last.low <= timestep
    }

    /// Every free interval at `to` that an agent can move into from `from`.
    ///
    /// The agent occupies `from_interval` at `from` and may leave at any time
    /// up to `from_interval.high - 1`, so it can arrive at `to` at any time in
    /// `[arrival_lower_bound, from_interval.high]`.  A candidate interval is
    /// returned if it is free and overlaps that window, except when entering
    /// it would swap places with another agent:
    ///
    /// ```text
    ///            from_interval.high == J.low
    ///                         │
    /// from:  ... [ free ......)[ owned by X ...
    /// to:    ... [ owned by X )[ J: free ...
    /// ```
    ///
    /// Entering `J` forces departure at `J.low - 1` while X moves `to → from`
    /// over the same step.  The check requires the boundary times to coincide
    /// exactly; it never excludes an interval that can be entered later.
    ///
    /// Costs and tie-breaking are the caller's business.  The arrival time
    /// into a returned interval `J` is `max(arrival_lower_bound, J.low)`.
    pub fn reachable_intervals(
        &self,
        from:                LocationId,
        from_interval:       SafeInterval,
        arrival_lower_bound: Timestep,
        to:                  LocationId,
    ) -> Vec<SafeInterval> {
        let latest_arrival = from_interval.high;
        if arrival_lower_bound > latest_arrival || arrival_lower_bound.is_unbounded() {
            return Vec::new();
        }

        let partition = self.partition(to);
        if partition.is_empty() {
            return vec![SafeInterval::UNBOUNDED];
        }

        // Whoever takes over `from` right after we must have left.
        let successor_owner = if from_interval.is_unbounded() {
            NO_AGENT
        } else {
            self.interval_at(from, from_interval.high).owner
        };

        let first = self.interval_at(to, arrival_lower_bound);
        let mut previous = partition.range(..first.low).next_back().map(|(_, i)| *i);
        let mut out = Vec::new();

        for (_, candidate) in partition.range(first.low..=latest_arrival) {
            let candidate = *candidate;
            let swap = candidate.low == from_interval.high
                && successor_owner != NO_AGENT
                && previous.is_some_and(|p| p.owner == successor_owner && p.high == candidate.low);

            if candidate.is_free() && !swap {
                out.push(candidate);
            }
            previous = Some(candidate);
        }
        out
    }

    /// Snapshot of the partition at `location`.
    pub fn intervals(&self, location: LocationId) -> Vec<SafeInterval> {
        let partition = self.partition(location);
        if partition.is_empty() {
            return vec![SafeInterval::UNBOUNDED];
        }
        partition.values().copied().collect()
    }

    /// Position of the interval starting at `low` within its partition.
    ///
    /// Stable for as long as the location is not mutated, which makes it a
    /// per-search identity for (location, interval) pairs.
    pub fn interval_ordinal(&self, location: LocationId, low: Timestep) -> usize {
        self.partition(location).range(..low).count()
    }

    /// Most intervals held by any one location (1 for an empty table).
    ///
    /// Bounds every [`interval_ordinal`](Self::interval_ordinal).  O(touched).
    pub fn max_intervals(&self) -> usize {
        self.touched
            .iter()
            .map(|l| self.partitions[l.index()].len())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    // ── Path commits ──────────────────────────────────────────────────────

    /// Claim every timestep of `path[start_offset..min(len, horizon))` for
    /// `agent`, one [`split`](Self::split) per maximal same-location run.
    ///
    /// Call once per committed path.  Claiming an overlapping range twice
    /// (even for the same agent) is a [`InvariantViolation::DoubleReservation`].
    pub fn insert_path(&mut self, agent: AgentId, path: &[PathEntry], start_offset: Timestep, horizon: Timestep) {
        let end = horizon.index().min(path.len());
        let path_runs = runs(path, start_offset.index(), end);
        tracing::debug!(%agent, start = %start_offset, end, runs = path_runs.len(), "insert path");
        for run in path_runs {
            self.split(agent, run.location, run.low, run.high);
        }
    }

    /// Release the part of a windowed plan from `start_offset + period` to
    /// `min(len, horizon)`.
    ///
    /// The boundary timestep may fall in the middle of a stay that began in
    /// the previous window, so the first run is cut with
    /// [`truncate`](Self::truncate) (or with `merge` when the owned interval
    /// also covers a later reservation, e.g. a parked goal).  Every later run
    /// is released with [`merge`](Self::merge).
    pub fn remove_path(
        &mut self,
        agent:        AgentId,
        path:         &[PathEntry],
        start_offset: Timestep,
        period:       u32,
        horizon:      Timestep,
    ) {
        let boundary = start_offset + period;
        let end = horizon.index().min(path.len());
        let path_runs = runs(path, boundary.index(), end);
        tracing::debug!(%agent, %boundary, end, runs = path_runs.len(), "remove path");

        let mut path_runs = path_runs.into_iter();
        if let Some(first) = path_runs.next() {
            let owned = self.interval_at(first.location, boundary);
            if owned.high == first.high {
                self.truncate(agent, first.location, boundary);
            } else {
                self.merge(agent, first.location, boundary, first.high);
            }
        }
        for run in path_runs {
            self.merge(agent, run.location, run.low, run.high);
        }
    }

    /// Park `agent` at `location` from `timestep` until the end of time.
    ///
    /// The caller must have checked [`is_location_clear`](Self::is_location_clear).
    pub fn reserve_goal(&mut self, agent: AgentId, location: LocationId, timestep: Timestep) {
        if !self.is_location_clear(location, timestep) {
            raise(InvariantViolation::LocationNotClear { agent, location, timestep });
        }
        tracing::debug!(%agent, %location, %timestep, "reserve goal");
        self.split(agent, location, timestep, MAX_TIMESTEP);
    }

    /// Undo [`reserve_goal`](Self::reserve_goal).
    pub fn unreserve_goal(&mut self, agent: AgentId, location: LocationId, timestep: Timestep) {
        tracing::debug!(%agent, %location, %timestep, "unreserve goal");
        self.merge(agent, location, timestep, MAX_TIMESTEP);
    }

    // ── Primitives ────────────────────────────────────────────────────────

    /// Give `agent` exclusive ownership of `[low, high)` at `location`.
    ///
    /// The range must lie inside a single free interval.  Relative to that
    /// interval it can match exactly, share its high end, share its low end,
    /// or sit strictly inside; the free remainders on either side are kept.
    /// If the claim touches an interval already owned by `agent` the two are
    /// fused, so no two neighbours ever share an owner.
    pub fn split(&mut self, agent: AgentId, location: LocationId, low: Timestep, high: Timestep) {
        check_range(agent, location, low, high);
        let found = self.interval_at(location, low);
        if !found.is_free() {
            raise(InvariantViolation::DoubleReservation { agent, location, low, high, owner: found.owner });
        }
        if high > found.high {
            raise(InvariantViolation::RangeNotContained {
                agent,
                location,
                low,
                high,
                interval_low:  found.low,
                interval_high: found.high,
            });
        }

        let partition = self.partition_mut(location);
        let mut claimed = SafeInterval::owned(low, high, agent);

        if found.low == low {
            if let Some(pred) = take_predecessor_owned_by(partition, found.low, agent) {
                claimed.low = pred.low;
            }
        }
        if found.high == high {
            if let Some(succ) = take_if_owned_by(partition, found.high, agent) {
                claimed.high = succ.high;
            }
        }

        partition.remove(&found.low);
        if found.low < low {
            partition.insert(found.low, SafeInterval::free(found.low, low));
        }
        if high < found.high {
            partition.insert(high, SafeInterval::free(high, found.high));
        }
        partition.insert(claimed.low, claimed);

        tracing::trace!(%agent, %location, %low, %high, %claimed, "split");
    }

    /// Release `[low, high)` owned by `agent` at `location`.
    ///
    /// The range must lie inside one interval owned by `agent`.  Parts of that
    /// interval outside the range stay owned; the released part joins any
    /// free neighbour, keeping the partition maximal.
    pub fn merge(&mut self, agent: AgentId, location: LocationId, low: Timestep, high: Timestep) {
        check_range(agent, location, low, high);
        let found = self.interval_at(location, low);
        if found.owner != agent {
            raise(InvariantViolation::NotOwner { agent, location, low, high, owner: found.owner });
        }
        if high > found.high {
            raise(InvariantViolation::RangeNotContained {
                agent,
                location,
                low,
                high,
                interval_low:  found.low,
                interval_high: found.high,
            });
        }

        let partition = self.partition_mut(location);
        let mut released = SafeInterval::free(low, high);

        if found.low == low {
            if let Some(pred) = take_predecessor_owned_by(partition, found.low, NO_AGENT) {
                released.low = pred.low;
            }
        }
        if found.high == high {
            if let Some(succ) = take_if_owned_by(partition, found.high, NO_AGENT) {
                released.high = succ.high;
            }
        }

        partition.remove(&found.low);
        if found.low < low {
            partition.insert(found.low, SafeInterval::owned(found.low, low, agent));
        }
        if high < found.high {
            partition.insert(high, SafeInterval::owned(high, found.high, agent));
        }
        partition.insert(released.low, released);

        tracing::trace!(%agent, %location, %low, %high, %released, "merge");
    }

    /// Shorten the interval owned by `agent` that covers `timestep` so it ends
    /// at `timestep`, freeing the remainder.
    ///
    /// When `timestep` is the interval's own `low` the whole interval is
    /// released.
    pub fn truncate(&mut self, agent: AgentId, location: LocationId, timestep: Timestep) {
        let found = self.interval_at(location, timestep);
        if found.owner != agent {
            raise(InvariantViolation::NotOwner {
                agent,
                location,
                low:   timestep,
                high:  found.high,
                owner: found.owner,
            });
        }
        tracing::trace!(%agent, %location, %timestep, interval = %found, "truncate");
        self.merge(agent, location, timestep, found.high);
    }

    // ── Housekeeping ──────────────────────────────────────────────────────

    /// Assert that `agent` owns nothing anywhere.
    pub fn agent_removed(&self, agent: AgentId) {
        for &location in &self.touched {
            for interval in self.partitions[location.index()].values() {
                if interval.owner == agent {
                    raise(InvariantViolation::AgentNotRemoved {
                        agent,
                        location,
                        low:  interval.low,
                        high: interval.high,
                    });
                }
            }
        }
    }

    /// Forget every reservation.  O(touched locations).
    pub fn clear(&mut self) {
        for location in self.touched.drain(..) {
            self.partitions[location.index()].clear();
        }
    }

    /// Assert both partition invariants at `location`.
    pub fn validate(&self, location: LocationId) {
        let partition = self.partition(location);
        if partition.is_empty() {
            return;
        }

        let mut expected_low = Timestep::ZERO;
        let mut previous: Option<&SafeInterval> = None;
        for (key, interval) in partition {
            if *key != interval.low {
                broken(location, format!("interval {interval} stored under key {key}"));
            }
            if interval.low != expected_low {
                broken(location, format!("interval {interval} should start at {expected_low}"));
            }
            if interval.is_empty() {
                broken(location, format!("interval {interval} is empty"));
            }
            if let Some(prev) = previous {
                if prev.owner == interval.owner {
                    broken(location, format!("neighbours {prev} and {interval} share an owner"));
                }
            }
            expected_low = interval.high;
            previous = Some(interval);
        }
        if expected_low != MAX_TIMESTEP {
            broken(location, format!("partition ends at {expected_low}"));
        }
    }

    /// [`validate`](Self::validate) every materialised location.
    pub fn validate_all(&self) {
        for &location in &self.touched {
            self.validate(location);
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn partition(&self, location: LocationId) -> &Partition {
        match self.partitions.get(location.index()) {
            Some(p) => p,
            None => raise(InvariantViolation::LocationOutOfRange { location, map_size: self.partitions.len() }),
        }
    }

    /// Materialise `location` on first use.
    fn partition_mut(&mut self, location: LocationId) -> &mut Partition {
        let map_size = self.partitions.len();
        let Some(partition) = self.partitions.get_mut(location.index()) else {
            raise(InvariantViolation::LocationOutOfRange { location, map_size });
        };
        if partition.is_empty() {
            partition.insert(Timestep::ZERO, SafeInterval::UNBOUNDED);
            self.touched.push(location);
        }
        partition
    }
}

fn broken(location: LocationId, detail: String) -> ! {
    raise(InvariantViolation::PartitionBroken { location, detail })
}

/// Reject empty, inverted, or past-the-end ranges and anonymous owners.
fn check_range(agent: AgentId, location: LocationId, low: Timestep, high: Timestep) {
    if low >= high || high > MAX_TIMESTEP || agent == NO_AGENT {
        raise(InvariantViolation::MalformedRange { agent, location, low, high });
    }
}

/// Remove and return the interval ending at `boundary` if `owner` owns it.
fn take_predecessor_owned_by(partition: &mut Partition, boundary: Timestep, owner: AgentId) -> Option<SafeInterval> {
    let pred = partition.range(..boundary).next_back().map(|(_, i)| *i)?;
    if pred.owner != owner {
        return None;
    }
    partition.remove(&pred.low)
}

/// Remove and return the interval starting at `boundary` if `owner` owns it.
fn take_if_owned_by(partition: &mut Partition, boundary: Timestep, owner: AgentId) -> Option<SafeInterval> {
    let succ = partition.get(&boundary).copied()?;
    if succ.owner != owner {
        return None;
    }
    partition.remove(&boundary)
}
