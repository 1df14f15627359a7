//! Unit tests for sipp-table.

use std::panic::{AssertUnwindSafe, catch_unwind};

use sipp_core::{AgentId, InvariantViolation, LocationId, MAX_TIMESTEP, NodeId, Timestep};

use crate::{NodeInit, SafeInterval, SafeIntervalTable};

// ── Helpers ───────────────────────────────────────────────────────────────────

const MAX: u32 = MAX_TIMESTEP.0;

fn free(low: u32, high: u32) -> SafeInterval {
    SafeInterval::free(Timestep(low), Timestep(high))
}

fn own(low: u32, high: u32, agent: u32) -> SafeInterval {
    SafeInterval::owned(Timestep(low), Timestep(high), AgentId(agent))
}

fn t(n: u32) -> Timestep {
    Timestep(n)
}

fn loc(n: u32) -> LocationId {
    LocationId(n)
}

fn a(n: u32) -> AgentId {
    AgentId(n)
}

/// Run `f`, expecting it to raise; return the structured payload.
fn violation<F: FnOnce()>(f: F) -> InvariantViolation {
    let payload = catch_unwind(AssertUnwindSafe(f)).expect_err("expected an invariant violation");
    payload
        .downcast_ref::<InvariantViolation>()
        .cloned()
        .expect("panic payload should be an InvariantViolation")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn init(location: u32) -> NodeInit {
    NodeInit {
        location:  loc(location),
        g:         0,
        h:         0,
        parent:    None,
        timestep:  Timestep::ZERO,
        interval:  SafeInterval::UNBOUNDED,
        conflicts: 0,
        tie:       0,
    }
}

// ── SafeInterval ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod interval {
    use super::*;

    #[test]
    fn unbounded_is_free_forever() {
        let i = SafeInterval::UNBOUNDED;
        assert!(i.is_free());
        assert!(i.is_unbounded());
        assert!(i.contains(t(0)));
        assert!(!i.contains(MAX_TIMESTEP));
    }

    #[test]
    fn half_open() {
        let i = own(5, 10, 3);
        assert!(!i.contains(t(4)));
        assert!(i.contains(t(5)));
        assert!(i.contains(t(9)));
        assert!(!i.contains(t(10)));
        assert_eq!(i.len(), 5);
    }

    #[test]
    fn display() {
        assert_eq!(free(0, 5).to_string(), "[0,5):FREE");
        assert_eq!(own(5, 10, 7).to_string(), "[5,10):7");
        assert_eq!(SafeInterval::UNBOUNDED.to_string(), "[0,MAX):FREE");
    }
}

// ── Table: documented scenarios ───────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn split_at_start() {
        let mut table = SafeIntervalTable::new(4);
        table.split(a(0), loc(1), t(0), t(10));
        assert_eq!(table.intervals(loc(1)), vec![own(0, 10, 0), free(10, MAX)]);
    }

    #[test]
    fn split_interior() {
        let mut table = SafeIntervalTable::new(4);
        table.split(a(0), loc(1), t(5), t(10));
        assert_eq!(table.intervals(loc(1)), vec![free(0, 5), own(5, 10, 0), free(10, MAX)]);
    }

    #[test]
    fn distinct_owners_touch() {
        let mut table = SafeIntervalTable::new(4);
        table.split(a(0), loc(1), t(5), t(10));
        table.split(a(1), loc(1), t(10), t(20));
        assert_eq!(
            table.intervals(loc(1)),
            vec![free(0, 5), own(5, 10, 0), own(10, 20, 1), free(20, MAX)]
        );
        table.validate(loc(1));
    }

    #[test]
    fn swap_is_excluded() {
        init_tracing();
        let (x, y) = (loc(0), loc(1));
        let mut table = SafeIntervalTable::new(2);
        // Agent 7 moves Y → X between t=3 and t=4.
        table.split(a(7), y, t(3), t(4));
        table.split(a(7), x, t(4), t(5));

        // Agent 9 sits at X until it must leave before 4.
        let from = table.first_free_interval(x, t(1)).unwrap();
        assert_eq!(from, free(0, 4));

        let reachable = table.reachable_intervals(x, from, t(2), y);
        // [0,3) is fine (arrive at 2).  [4,MAX) would mean leaving X at 3
        // while agent 7 leaves Y for X at the same step.
        assert_eq!(reachable, vec![free(0, 3)]);
    }

    #[test]
    fn lazy_block_allocation_and_reset() {
        let mut pool = crate::NodeMemoryPool::for_map(8, 512).unwrap();
        assert_eq!(pool.allocated_blocks(), 0);

        let id = NodeId(2000);
        let handle = pool.generate_node(id, init(3));
        assert_eq!(pool.allocated_blocks(), 1);
        assert!(pool.has_node(id));
        assert_eq!(pool.get_node(id).location, loc(3));
        assert_eq!(pool.node(handle).location, loc(3));

        pool.reset();
        assert!(!pool.has_node(id));
        assert_eq!(pool.allocated_blocks(), 1);
        assert_eq!(pool.generated(), 0);
    }
}

// ── Table: queries ────────────────────────────────────────────────────────────

#[cfg(test)]
mod queries {
    use super::*;

    #[test]
    fn untouched_location_reads_as_unbounded() {
        let table = SafeIntervalTable::new(3);
        assert_eq!(table.interval_at(loc(2), t(1234)), SafeInterval::UNBOUNDED);
        assert_eq!(table.first_free_interval(loc(2), t(0)), Some(SafeInterval::UNBOUNDED));
        assert_eq!(table.intervals(loc(2)), vec![SafeInterval::UNBOUNDED]);
        assert!(table.touched_locations().is_empty());
    }

    #[test]
    fn first_free_interval_skips_owned() {
        let mut table = SafeIntervalTable::new(3);
        table.split(a(2), loc(0), t(3), t(6));
        assert_eq!(table.first_free_interval(loc(0), t(2)), Some(free(0, 3)));
        assert_eq!(table.first_free_interval(loc(0), t(3)), None);
        assert_eq!(table.first_free_interval(loc(0), t(5)), None);
        assert_eq!(table.first_free_interval(loc(0), t(6)), Some(free(6, MAX)));
        assert_eq!(table.first_free_interval(loc(0), MAX_TIMESTEP), None);
    }

    #[test]
    fn location_clear() {
        let mut table = SafeIntervalTable::new(3);
        assert!(table.is_location_clear(loc(0), t(0)));
        table.split(a(2), loc(0), t(3), t(6));
        assert!(!table.is_location_clear(loc(0), t(5)));
        assert!(table.is_location_clear(loc(0), t(6)));
        assert!(table.is_location_clear(loc(0), t(100)));
    }

    #[test]
    fn reachable_into_untouched() {
        let table = SafeIntervalTable::new(2);
        let got = table.reachable_intervals(loc(0), SafeInterval::UNBOUNDED, t(1), loc(1));
        assert_eq!(got, vec![SafeInterval::UNBOUNDED]);
    }

    #[test]
    fn reachable_waits_out_reservation() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(3), loc(1), t(0), t(5));
        let got = table.reachable_intervals(loc(0), SafeInterval::UNBOUNDED, t(1), loc(1));
        assert_eq!(got, vec![free(5, MAX)]);
    }

    #[test]
    fn reachable_limited_by_departure_window() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(3), loc(1), t(0), t(5));
        table.split(a(4), loc(0), t(4), t(8));
        let from = table.interval_at(loc(0), t(1));
        assert_eq!(from, free(0, 4));
        // Must leave loc 0 by t=3, arriving by t=4; loc 1 is owned until 5.
        assert!(table.reachable_intervals(loc(0), from, t(2), loc(1)).is_empty());
    }

    #[test]
    fn reachable_empty_when_lower_bound_past_window() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(4), loc(0), t(4), t(8));
        let from = table.interval_at(loc(0), t(0));
        assert!(table.reachable_intervals(loc(0), from, t(5), loc(1)).is_empty());
    }

    #[test]
    fn non_coincident_boundaries_are_not_swaps() {
        let (x, y) = (loc(0), loc(1));
        let mut table = SafeIntervalTable::new(2);
        table.split(a(7), y, t(2), t(3));
        table.split(a(7), x, t(4), t(5));
        let from = table.interval_at(x, t(0));
        let got = table.reachable_intervals(x, from, t(1), y);
        assert_eq!(got, vec![free(0, 2), free(3, MAX)]);
    }

    #[test]
    fn follow_is_not_a_swap() {
        // A different agent takes X next; entering Y at the boundary is fine.
        let (x, y) = (loc(0), loc(1));
        let mut table = SafeIntervalTable::new(2);
        table.split(a(7), y, t(3), t(4));
        table.split(a(8), x, t(4), t(5));
        let from = table.interval_at(x, t(0));
        let got = table.reachable_intervals(x, from, t(1), y);
        assert_eq!(got, vec![free(0, 3), free(4, MAX)]);
    }

    #[test]
    fn ordinals() {
        let mut table = SafeIntervalTable::new(2);
        assert_eq!(table.interval_ordinal(loc(1), t(0)), 0);
        table.split(a(0), loc(1), t(5), t(10));
        table.split(a(1), loc(1), t(10), t(20));
        assert_eq!(table.interval_ordinal(loc(1), t(0)), 0);
        assert_eq!(table.interval_ordinal(loc(1), t(10)), 2);
        assert_eq!(table.interval_ordinal(loc(1), t(20)), 3);
        assert_eq!(table.max_intervals(), 4);
        assert_eq!(SafeIntervalTable::new(2).max_intervals(), 1);
    }
}

// ── Table: path commits ───────────────────────────────────────────────────────

#[cfg(test)]
mod paths {
    use sipp_core::path_from_locations;

    use super::*;

    #[test]
    fn insert_then_remove_restores_table() {
        init_tracing();
        let mut table = SafeIntervalTable::new(4);
        let path = path_from_locations(&[1, 1, 2, 3, 3, 3]);
        table.insert_path(a(4), &path, t(0), MAX_TIMESTEP);

        assert_eq!(table.intervals(loc(1)), vec![own(0, 2, 4), free(2, MAX)]);
        assert_eq!(table.intervals(loc(2)), vec![free(0, 2), own(2, 3, 4), free(3, MAX)]);
        assert_eq!(table.intervals(loc(3)), vec![free(0, 3), own(3, 6, 4), free(6, MAX)]);
        table.validate_all();

        table.remove_path(a(4), &path, t(0), 0, MAX_TIMESTEP);
        for l in 1..4 {
            assert_eq!(table.intervals(loc(l)), vec![SafeInterval::UNBOUNDED]);
        }
        table.agent_removed(a(4));
        table.validate_all();
    }

    #[test]
    fn horizon_limits_insert() {
        let mut table = SafeIntervalTable::new(4);
        let path = path_from_locations(&[1, 1, 2, 3, 3, 3]);
        table.insert_path(a(4), &path, t(0), t(3));
        assert_eq!(table.intervals(loc(2)), vec![free(0, 2), own(2, 3, 4), free(3, MAX)]);
        assert_eq!(table.intervals(loc(3)), vec![SafeInterval::UNBOUNDED]);
    }

    #[test]
    fn windowed_remove_truncates_at_boundary() {
        let mut table = SafeIntervalTable::new(3);
        let path = path_from_locations(&[1, 1, 1, 1, 2, 2]);
        table.insert_path(a(0), &path, t(0), MAX_TIMESTEP);
        table.remove_path(a(0), &path, t(0), 2, MAX_TIMESTEP);
        assert_eq!(table.intervals(loc(1)), vec![own(0, 2, 0), free(2, MAX)]);
        assert_eq!(table.intervals(loc(2)), vec![SafeInterval::UNBOUNDED]);
    }

    #[test]
    fn windowed_inserts_coalesce() {
        let mut table = SafeIntervalTable::new(2);
        let path = path_from_locations(&[1, 1, 1, 1]);
        table.insert_path(a(0), &path, t(0), t(2));
        table.insert_path(a(0), &path, t(2), t(4));
        assert_eq!(table.intervals(loc(1)), vec![own(0, 4, 0), free(4, MAX)]);
    }

    #[test]
    fn goal_reservation_joins_path() {
        let mut table = SafeIntervalTable::new(3);
        let path = path_from_locations(&[1, 2, 2]);
        table.insert_path(a(5), &path, t(0), MAX_TIMESTEP);
        assert!(table.is_location_clear(loc(2), t(3)));
        table.reserve_goal(a(5), loc(2), t(3));
        assert_eq!(table.intervals(loc(2)), vec![free(0, 1), own(1, MAX, 5)]);
        assert!(!table.is_location_clear(loc(2), t(50)));

        // Releasing the window past t=2 must keep the parked goal.
        table.remove_path(a(5), &path, t(0), 2, MAX_TIMESTEP);
        assert_eq!(
            table.intervals(loc(2)),
            vec![free(0, 1), own(1, 2, 5), free(2, 3), own(3, MAX, 5)]
        );

        table.unreserve_goal(a(5), loc(2), t(3));
        assert_eq!(table.intervals(loc(2)), vec![free(0, 1), own(1, 2, 5), free(2, MAX)]);
        table.validate_all();
    }

    #[test]
    fn goal_on_unclear_location_is_fatal() {
        let mut table = SafeIntervalTable::new(6);
        table.split(a(1), loc(5), t(10), t(12));
        let v = violation(|| table.reserve_goal(a(2), loc(5), t(3)));
        assert_eq!(v, InvariantViolation::LocationNotClear { agent: a(2), location: loc(5), timestep: t(3) });
    }

    #[test]
    fn agent_removed_reports_leftovers() {
        let mut table = SafeIntervalTable::new(3);
        table.split(a(1), loc(2), t(4), t(6));
        let v = violation(|| table.agent_removed(a(1)));
        assert_eq!(
            v,
            InvariantViolation::AgentNotRemoved { agent: a(1), location: loc(2), low: t(4), high: t(6) }
        );
        table.agent_removed(a(2));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table = SafeIntervalTable::new(3);
        table.split(a(1), loc(2), t(4), t(6));
        table.split(a(1), loc(0), t(0), t(1));
        assert_eq!(table.touched_locations(), &[loc(2), loc(0)]);
        table.clear();
        assert!(table.touched_locations().is_empty());
        assert_eq!(table.intervals(loc(2)), vec![SafeInterval::UNBOUNDED]);
        table.split(a(3), loc(2), t(4), t(6));
        assert_eq!(table.touched_locations(), &[loc(2)]);
    }
}

// ── Table: fatal preconditions ────────────────────────────────────────────────

#[cfg(test)]
mod violations {
    use super::*;

    #[test]
    fn double_reservation() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(0), t(10));
        let v = violation(|| table.split(a(2), loc(1), t(5), t(6)));
        assert_eq!(
            v,
            InvariantViolation::DoubleReservation {
                agent:    a(2),
                location: loc(1),
                low:      t(5),
                high:     t(6),
                owner:    a(1),
            }
        );
    }

    #[test]
    fn same_agent_twice_is_still_double() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(0), t(10));
        let v = violation(|| table.split(a(1), loc(1), t(2), t(3)));
        assert!(matches!(v, InvariantViolation::DoubleReservation { owner, .. } if owner == a(1)));
    }

    #[test]
    fn claim_crossing_interval_boundary() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(5), t(10));
        let v = violation(|| table.split(a(2), loc(1), t(0), t(7)));
        assert_eq!(
            v,
            InvariantViolation::RangeNotContained {
                agent:         a(2),
                location:      loc(1),
                low:           t(0),
                high:          t(7),
                interval_low:  t(0),
                interval_high: t(5),
            }
        );
    }

    #[test]
    fn release_by_non_owner() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(5), t(10));
        let v = violation(|| table.merge(a(2), loc(1), t(5), t(10)));
        assert!(matches!(v, InvariantViolation::NotOwner { owner, .. } if owner == a(1)));
        let v = violation(|| table.truncate(a(2), loc(1), t(7)));
        assert!(matches!(v, InvariantViolation::NotOwner { .. }));
    }

    #[test]
    fn anonymous_owner_rejected() {
        let mut table = SafeIntervalTable::new(2);
        let v = violation(|| table.split(sipp_core::NO_AGENT, loc(1), t(0), t(1)));
        assert!(matches!(v, InvariantViolation::MalformedRange { .. }));
    }

    #[test]
    fn location_out_of_range() {
        let table = SafeIntervalTable::new(2);
        let v = violation(|| {
            table.interval_at(loc(5), t(0));
        });
        assert_eq!(v, InvariantViolation::LocationOutOfRange { location: loc(5), map_size: 2 });
    }

    #[test]
    fn message_names_the_parties() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(0), t(10));
        let v = violation(|| table.split(a(2), loc(1), t(5), t(6)));
        let msg = v.to_string();
        assert!(msg.contains("AgentId(2)"), "{msg}");
        assert!(msg.contains("AgentId(1)"), "{msg}");
        assert!(msg.contains("LocationId(1)"), "{msg}");
    }
}

// ── Table: boundary lengths {0, 1, 2} ────────────────────────────────────────

#[cfg(test)]
mod boundaries {
    use super::*;

    #[test]
    fn zero_length_is_fatal_everywhere() {
        let mut table = SafeIntervalTable::new(2);
        let v = violation(|| table.split(a(1), loc(1), t(5), t(5)));
        assert!(matches!(v, InvariantViolation::MalformedRange { .. }));

        table.split(a(1), loc(1), t(5), t(7));
        let v = violation(|| table.merge(a(1), loc(1), t(6), t(6)));
        assert!(matches!(v, InvariantViolation::MalformedRange { .. }));

        // Truncating at the interval's end is a zero-length release.
        let v = violation(|| table.truncate(a(1), loc(1), t(7)));
        assert!(matches!(v, InvariantViolation::NotOwner { .. }));
    }

    #[test]
    fn length_one() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(5), t(6));
        assert_eq!(table.intervals(loc(1)), vec![free(0, 5), own(5, 6, 1), free(6, MAX)]);
        table.merge(a(1), loc(1), t(5), t(6));
        assert_eq!(table.intervals(loc(1)), vec![SafeInterval::UNBOUNDED]);

        table.split(a(1), loc(1), t(5), t(6));
        table.truncate(a(1), loc(1), t(5));
        assert_eq!(table.intervals(loc(1)), vec![SafeInterval::UNBOUNDED]);

        table.split(a(1), loc(1), t(0), t(1));
        assert_eq!(table.intervals(loc(1)), vec![own(0, 1, 1), free(1, MAX)]);
    }

    #[test]
    fn length_two() {
        let mut table = SafeIntervalTable::new(2);
        table.split(a(1), loc(1), t(5), t(7));
        table.truncate(a(1), loc(1), t(6));
        assert_eq!(table.intervals(loc(1)), vec![free(0, 5), own(5, 6, 1), free(6, MAX)]);

        table.split(a(1), loc(1), t(6), t(7));
        assert_eq!(table.intervals(loc(1)), vec![free(0, 5), own(5, 7, 1), free(7, MAX)]);

        // Release the first half, then the second.
        table.merge(a(1), loc(1), t(5), t(6));
        assert_eq!(table.intervals(loc(1)), vec![free(0, 6), own(6, 7, 1), free(7, MAX)]);
        table.merge(a(1), loc(1), t(6), t(7));
        assert_eq!(table.intervals(loc(1)), vec![SafeInterval::UNBOUNDED]);
    }

    #[test]
    fn split_then_merge_is_identity() {
        for (low, high) in [(0, 1), (0, 2), (3, 4), (3, 5), (MAX - 1, MAX), (MAX - 2, MAX)] {
            let mut table = SafeIntervalTable::new(1);
            table.split(a(9), loc(0), t(low), t(high));
            table.validate(loc(0));
            table.merge(a(9), loc(0), t(low), t(high));
            assert_eq!(table.intervals(loc(0)), vec![SafeInterval::UNBOUNDED], "[{low},{high})");
        }
    }

    #[test]
    fn merge_inside_owned_interval_keeps_both_ends() {
        let mut table = SafeIntervalTable::new(1);
        table.split(a(2), loc(0), t(2), t(8));
        table.merge(a(2), loc(0), t(4), t(5));
        assert_eq!(
            table.intervals(loc(0)),
            vec![free(0, 2), own(2, 4, 2), free(4, 5), own(5, 8, 2), free(8, MAX)]
        );
        table.validate(loc(0));
    }
}

// ── Table: partition invariants under random reservations ─────────────────────

#[cfg(test)]
mod partition_props {
    use proptest::prelude::*;
    use sipp_core::PathEntry;

    use super::*;

    /// (agent, location, low, length)
    fn arb_claim() -> impl Strategy<Value = (u32, u32, u32, u32)> {
        (0u32..4, 0u32..3, 0u32..40, 1u32..6)
    }

    proptest! {
        #[test]
        fn claims_and_releases_keep_partition(claims in prop::collection::vec(arb_claim(), 1..40)) {
            let mut table = SafeIntervalTable::new(3);
            let mut accepted = Vec::new();

            for (agent, l, low, len) in claims {
                let (lo, hi) = (t(low), t(low + len));
                let found = table.interval_at(loc(l), lo);
                if !found.is_free() || hi > found.high {
                    continue;
                }
                table.split(a(agent), loc(l), lo, hi);
                table.validate_all();
                accepted.push((agent, l, lo, hi));
            }

            for &(agent, l, lo, hi) in &accepted {
                for t_ in lo.0..hi.0 {
                    prop_assert_eq!(table.interval_at(loc(l), t(t_)).owner, a(agent));
                }
            }

            for (agent, l, lo, hi) in accepted.into_iter().rev() {
                table.merge(a(agent), loc(l), lo, hi);
                table.validate_all();
            }
            for l in 0..3 {
                prop_assert_eq!(table.intervals(loc(l)), vec![SafeInterval::UNBOUNDED]);
            }
        }

        /// Releasing a windowed plan from `start + period` leaves exactly
        /// what committing only `[start, start + period)` would have.
        #[test]
        fn windowed_remove_matches_shorter_insert(
            background in prop::collection::vec((1u32..4, 1u32..4, 0u32..30, 1u32..5), 0..25),
            steps in prop::collection::vec(0u32..4, 1..24),
            start in 0usize..24,
            period in 0u32..24,
        ) {
            let build = || {
                let mut table = SafeIntervalTable::new(4);
                for &(agent, l, low, len) in &background {
                    let (lo, hi) = (t(low), t(low + len));
                    let found = table.interval_at(loc(l), lo);
                    if found.is_free() && hi <= found.high {
                        table.split(a(agent), loc(l), lo, hi);
                    }
                }
                table
            };

            // Location 0 is never reserved in the background, so any step
            // that would collide falls back to it.
            let base = build();
            let start = start.min(steps.len() - 1);
            let path: Vec<PathEntry> = steps
                .iter()
                .enumerate()
                .map(|(i, &l)| {
                    let blocked = i >= start && !base.interval_at(loc(l), Timestep::from(i)).is_free();
                    PathEntry::new(if blocked { loc(0) } else { loc(l) })
                })
                .collect();
            let start = Timestep::from(start);

            let mut windowed = build();
            windowed.insert_path(a(0), &path, start, MAX_TIMESTEP);
            windowed.validate_all();
            windowed.remove_path(a(0), &path, start, period, MAX_TIMESTEP);
            windowed.validate_all();

            let mut shorter = build();
            shorter.insert_path(a(0), &path, start, start + period);

            for l in 0..4 {
                prop_assert_eq!(windowed.intervals(loc(l)), shorter.intervals(loc(l)));
            }
        }
    }
}

// ── NodeMemoryPool ────────────────────────────────────────────────────────────

#[cfg(test)]
mod pool {
    use super::*;
    use crate::{NodeMemoryPool, PoolConfig};

    fn small_pool() -> NodeMemoryPool {
        NodeMemoryPool::new(PoolConfig { capacity: 64, block_size: 16 }).unwrap()
    }

    #[test]
    fn config_validation() {
        assert!(PoolConfig { capacity: 0, block_size: 16 }.validate().is_err());
        assert!(PoolConfig { capacity: 10, block_size: 12 }.validate().is_err());
        assert!(PoolConfig { capacity: 10, block_size: 16 }.validate().is_ok());
        assert!(PoolConfig::for_map(usize::MAX, 2).is_err());
        assert!(NodeMemoryPool::new(PoolConfig { capacity: 10, block_size: 0 }).is_err());
    }

    #[test]
    fn blocks_allocated_on_touch() {
        let mut pool = small_pool();
        assert_eq!(pool.allocated_blocks(), 0);
        let slot = pool.touch(NodeId(17));
        assert_eq!(slot.label(), 0);
        assert_eq!(slot.id(), NodeId::INVALID);
        assert_eq!(pool.allocated_blocks(), 1);
        pool.touch(NodeId(31));
        assert_eq!(pool.allocated_blocks(), 1);
        pool.touch(NodeId(32));
        assert_eq!(pool.allocated_blocks(), 2);
        assert!(!pool.has_node(NodeId(17)));
    }

    #[test]
    fn generate_and_close() {
        let mut pool = small_pool();
        let h = pool.generate_node(NodeId(5), init(1));
        assert_eq!(h.id(), NodeId(5));
        assert_eq!(h.epoch(), pool.epoch());
        assert_eq!(pool.generated(), 1);
        assert!(!pool.is_closed(NodeId(5)));
        pool.close_node(NodeId(5));
        assert!(pool.is_closed(NodeId(5)));
        pool.get_node_mut(NodeId(5)).g = 12;
        assert_eq!(pool.get_node(NodeId(5)).g, 12);
        assert_eq!(pool.touch(NodeId(5)).bound_location(), loc(1));
    }

    #[test]
    fn parent_handles_resolve() {
        let mut pool = small_pool();
        let parent = pool.generate_node(NodeId(1), init(1));
        let mut child = init(2);
        child.parent = Some(parent);
        pool.generate_node(NodeId(2), child);
        let back = pool.get_node(NodeId(2)).parent.unwrap();
        assert_eq!(pool.node(back).location, loc(1));
    }

    #[test]
    fn double_generation_is_fatal() {
        let mut pool = small_pool();
        pool.generate_node(NodeId(3), init(1));
        let v = violation(|| {
            pool.generate_node(NodeId(3), init(1));
        });
        assert_eq!(v, InvariantViolation::DoubleGeneration { id: NodeId(3), epoch: 1 });
    }

    #[test]
    fn slot_location_is_fixed() {
        let mut pool = small_pool();
        pool.generate_node(NodeId(3), init(1));
        pool.reset();
        pool.generate_node(NodeId(3), init(1));
        pool.reset();
        let v = violation(|| {
            pool.generate_node(NodeId(3), init(2));
        });
        assert_eq!(v, InvariantViolation::LocationRebound { id: NodeId(3), bound: loc(1), requested: loc(2) });
    }

    #[test]
    fn stale_handle_is_fatal() {
        let mut pool = small_pool();
        let h = pool.generate_node(NodeId(3), init(1));
        pool.reset();
        pool.generate_node(NodeId(3), init(1));
        let v = violation(|| {
            pool.node(h);
        });
        assert_eq!(v, InvariantViolation::StaleHandle { id: NodeId(3), handle_epoch: 1, pool_epoch: 2 });
    }

    #[test]
    fn dead_nodes_are_unreadable() {
        let mut pool = small_pool();
        let v = violation(|| {
            pool.get_node(NodeId(4));
        });
        assert_eq!(v, InvariantViolation::NodeNotLive { id: NodeId(4), epoch: 1 });

        pool.generate_node(NodeId(4), init(1));
        pool.reset();
        let v = violation(|| pool.close_node(NodeId(4)));
        assert_eq!(v, InvariantViolation::NodeNotLive { id: NodeId(4), epoch: 2 });
    }

    #[test]
    fn closed_query_is_epoch_gated() {
        let mut pool = small_pool();
        assert!(!pool.is_closed(NodeId(9)));
        assert_eq!(pool.allocated_blocks(), 0);

        pool.generate_node(NodeId(9), init(3));
        pool.close_node(NodeId(9));
        assert!(pool.is_closed(NodeId(9)));

        pool.reset();
        assert!(!pool.is_closed(NodeId(9)));
        pool.generate_node(NodeId(9), init(3));
        assert!(!pool.is_closed(NodeId(9)));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut pool = NodeMemoryPool::new(PoolConfig { capacity: 10, block_size: 16 }).unwrap();
        pool.touch(NodeId(9));
        let v = violation(|| {
            pool.touch(NodeId(10));
        });
        assert_eq!(v, InvariantViolation::PoolCapacityExceeded { id: NodeId(10), capacity: 10 });
        let v = violation(|| {
            pool.has_node(NodeId(11));
        });
        assert!(matches!(v, InvariantViolation::PoolCapacityExceeded { .. }));
    }

    #[test]
    fn free_node_allows_regeneration() {
        let mut pool = small_pool();
        pool.generate_node(NodeId(6), init(2));
        pool.generate_node(NodeId(7), init(2));
        pool.free_node(NodeId(6));
        assert!(!pool.has_node(NodeId(6)));
        assert_eq!(pool.generated(), 1);
        pool.generate_node(NodeId(6), init(2));
        assert!(pool.has_node(NodeId(6)));
        assert_eq!(pool.generated(), 2);
    }

    #[test]
    fn epoch_wrap_relabels_slots() {
        let mut pool = small_pool();
        // Live in epoch 1, then fast-forward to the last epoch.
        pool.generate_node(NodeId(0), init(0));
        pool.set_epoch(u32::MAX);
        pool.generate_node(NodeId(1), init(0));
        assert!(pool.has_node(NodeId(1)));

        pool.reset();
        assert_eq!(pool.epoch(), 1);
        assert!(!pool.has_node(NodeId(0)));
        assert!(!pool.has_node(NodeId(1)));
        assert_eq!(pool.touch(NodeId(0)).label(), 0);
    }
}
