//! Fatal invariant violations.
//!
//! The reservation table and the node pool each have exactly one trusted
//! caller (the search driver or the coordinator above it).  When that caller
//! breaks a precondition (double reservation, releasing someone else's
//! interval, dereferencing a stale node) there is nothing sensible to recover,
//! so the core panics.
//!
//! The panic payload is the structured [`InvariantViolation`] itself (via
//! [`std::panic::panic_any`]), not a formatted string, so a test harness can
//! `catch_unwind` and inspect exactly which agent, location, and interval
//! bounds were involved:
//!
//! ```
//! use std::panic::{catch_unwind, AssertUnwindSafe};
//! use sipp_core::{raise, InvariantViolation, NodeId};
//!
//! let err = catch_unwind(AssertUnwindSafe(|| {
//!     raise(InvariantViolation::NodeNotLive { id: NodeId(3), epoch: 1 })
//! }))
//! .unwrap_err();
//! let v = err.downcast_ref::<InvariantViolation>().unwrap();
//! assert!(matches!(v, InvariantViolation::NodeNotLive { .. }));
//! ```

use thiserror::Error;

use crate::{AgentId, LocationId, NodeId, Timestep};

/// A broken precondition inside the planning core.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    // ── Reservation table ─────────────────────────────────────────────────
    #[error("{agent} cannot claim [{low}, {high}) at {location}: already owned by {owner}")]
    DoubleReservation {
        agent:    AgentId,
        location: LocationId,
        low:      Timestep,
        high:     Timestep,
        owner:    AgentId,
    },

    #[error("{agent} passed malformed range [{low}, {high}) at {location}")]
    MalformedRange {
        agent:    AgentId,
        location: LocationId,
        low:      Timestep,
        high:     Timestep,
    },

    #[error(
        "{agent} range [{low}, {high}) at {location} crosses interval \
         [{interval_low}, {interval_high})"
    )]
    RangeNotContained {
        agent:         AgentId,
        location:      LocationId,
        low:           Timestep,
        high:          Timestep,
        interval_low:  Timestep,
        interval_high: Timestep,
    },

    #[error("{agent} cannot release [{low}, {high}) at {location}: owned by {owner}")]
    NotOwner {
        agent:    AgentId,
        location: LocationId,
        low:      Timestep,
        high:     Timestep,
        owner:    AgentId,
    },

    #[error("{agent} cannot park at {location} from {timestep}: location is not clear")]
    LocationNotClear {
        agent:    AgentId,
        location: LocationId,
        timestep: Timestep,
    },

    #[error("location {location} outside table of {map_size} locations")]
    LocationOutOfRange { location: LocationId, map_size: usize },

    #[error("{agent} still owns [{low}, {high}) at {location} after removal")]
    AgentNotRemoved {
        agent:    AgentId,
        location: LocationId,
        low:      Timestep,
        high:     Timestep,
    },

    #[error("partition at {location} is broken: {detail}")]
    PartitionBroken { location: LocationId, detail: String },

    // ── Node pool ─────────────────────────────────────────────────────────
    #[error("node {id} is not live in epoch {epoch}")]
    NodeNotLive { id: NodeId, epoch: u32 },

    #[error("node {id} generated twice in epoch {epoch}")]
    DoubleGeneration { id: NodeId, epoch: u32 },

    #[error("slot {id} is bound to {bound}, cannot host a node at {requested}")]
    LocationRebound {
        id:        NodeId,
        bound:     LocationId,
        requested: LocationId,
    },

    #[error("handle to {id} from epoch {handle_epoch} used in epoch {pool_epoch}")]
    StaleHandle {
        id:           NodeId,
        handle_epoch: u32,
        pool_epoch:   u32,
    },

    #[error("node id {id} exceeds pool capacity {capacity}")]
    PoolCapacityExceeded { id: NodeId, capacity: usize },

    #[error("interval #{ordinal} at {location} exceeds {slots} pool slots per location")]
    SlotsPerLocationExceeded {
        location: LocationId,
        ordinal:  usize,
        slots:    usize,
    },
}

/// Log `violation` and panic with it as the payload.
#[cold]
#[track_caller]
pub fn raise(violation: InvariantViolation) -> ! {
    tracing::error!(%violation, "invariant violation");
    std::panic::panic_any(violation)
}
