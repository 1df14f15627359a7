//! `NodeMemoryPool` — reusable, epoch-stamped storage for search nodes.
//!
//! # Layout
//!
//! Slots live in fixed-size blocks allocated on first touch:
//!
//! ```text
//! blocks[id >> shift] : Option<Box<[Slot; block_size]>>
//! slot = blocks[id >> shift][id & mask]
//! ```
//!
//! A map with millions of locations costs one `Vec<Option<_>>` up front;
//! only the blocks a search actually reaches are ever allocated.
//!
//! # Epochs
//!
//! A slot holds a live node iff `slot.label == pool.epoch` and its id is
//! valid.  [`reset`](NodeMemoryPool::reset) bumps the epoch, which kills
//! every node in O(1) without touching memory.  When the `u32` epoch
//! wraps, every allocated slot is relabelled to 0 and counting restarts
//! at 1, so a slot from 2^32 searches ago can never look live again.

use sipp_core::{CoreError, CoreResult, InvariantViolation, LocationId, NodeId, raise};

use crate::{NodeHandle, NodeInit, SearchNode};

/// Default number of slots per lazily allocated block.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

// ── PoolConfig ────────────────────────────────────────────────────────────────

/// Sizing of a [`NodeMemoryPool`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Total number of addressable node ids.
    pub capacity:   usize,
    /// Slots per block.  Must be a power of two.
    pub block_size: usize,
}

impl PoolConfig {
    /// Room for `slots_per_location` nodes at each of `map_size` locations.
    pub fn for_map(map_size: usize, slots_per_location: usize) -> CoreResult<Self> {
        let capacity = map_size.checked_mul(slots_per_location).ok_or_else(|| {
            CoreError::Config(format!("{map_size} locations × {slots_per_location} slots overflows"))
        })?;
        Ok(Self { capacity, block_size: DEFAULT_BLOCK_SIZE })
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.capacity == 0 {
            return Err(CoreError::Config("pool capacity must be positive".into()));
        }
        // NodeId::INVALID (u32::MAX) is reserved.
        if self.capacity > u32::MAX as usize {
            return Err(CoreError::Config(format!(
                "pool capacity {} exceeds the node id space",
                self.capacity
            )));
        }
        if !self.block_size.is_power_of_two() {
            return Err(CoreError::Config(format!(
                "block size {} is not a power of two",
                self.block_size
            )));
        }
        Ok(())
    }
}

// ── Slot ──────────────────────────────────────────────────────────────────────

/// One pool cell.
#[derive(Clone, Debug)]
pub struct Slot {
    label: u32,
    id:    NodeId,
    bound: LocationId,
    node:  SearchNode,
}

impl Slot {
    fn empty() -> Self {
        Self {
            label: 0,
            id:    NodeId::INVALID,
            bound: LocationId::INVALID,
            node:  SearchNode::default(),
        }
    }

    /// Epoch in which this slot last held a node.
    pub fn label(&self) -> u32 {
        self.label
    }

    /// `NodeId::INVALID` until a node is generated here.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The location this slot was first generated for; fixed thereafter.
    pub fn bound_location(&self) -> LocationId {
        self.bound
    }

    pub fn node(&self) -> &SearchNode {
        &self.node
    }
}

// ── NodeMemoryPool ────────────────────────────────────────────────────────────

pub struct NodeMemoryPool {
    blocks:    Vec<Option<Box<[Slot]>>>,
    capacity:  usize,
    shift:     u32,
    mask:      usize,
    epoch:     u32,
    generated: usize,
}

impl NodeMemoryPool {
    pub fn new(config: PoolConfig) -> CoreResult<Self> {
        config.validate()?;
        let block_count = config.capacity.div_ceil(config.block_size);
        tracing::debug!(capacity = config.capacity, block_size = config.block_size, block_count, "node pool created");
        Ok(Self {
            blocks:    (0..block_count).map(|_| None).collect(),
            capacity:  config.capacity,
            shift:     config.block_size.trailing_zeros(),
            mask:      config.block_size - 1,
            epoch:     1,
            generated: 0,
        })
    }

    /// Shorthand for `new(PoolConfig::for_map(..)?)`.
    pub fn for_map(map_size: usize, slots_per_location: usize) -> CoreResult<Self> {
        Self::new(PoolConfig::for_map(map_size, slots_per_location)?)
    }

    // ── Slot access ───────────────────────────────────────────────────────

    /// The slot for `id`, allocating its block if needed.
    pub fn touch(&mut self, id: NodeId) -> &Slot {
        self.slot_mut(id)
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        let (block, offset) = self.locate(id);
        let size = self.mask + 1;
        let block = self.blocks[block].get_or_insert_with(|| (0..size).map(|_| Slot::empty()).collect());
        &mut block[offset]
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        let (block, offset) = self.locate(id);
        self.blocks[block].as_ref().map(|b| &b[offset])
    }

    fn locate(&self, id: NodeId) -> (usize, usize) {
        if id.index() >= self.capacity {
            raise(InvariantViolation::PoolCapacityExceeded { id, capacity: self.capacity });
        }
        (id.index() >> self.shift, id.index() & self.mask)
    }

    fn is_live(&self, slot: &Slot) -> bool {
        slot.label == self.epoch && slot.id.is_valid()
    }

    fn live_mut(&mut self, id: NodeId) -> &mut Slot {
        let epoch = self.epoch;
        let slot = self.slot_mut(id);
        if slot.label != epoch || !slot.id.is_valid() {
            raise(InvariantViolation::NodeNotLive { id, epoch });
        }
        slot
    }

    // ── Node lifecycle ────────────────────────────────────────────────────

    /// Materialise a node at `id` for the current epoch.
    ///
    /// The first generation at `id` binds the slot to `init.location`; later
    /// epochs must reuse the same location.
    pub fn generate_node(&mut self, id: NodeId, init: NodeInit) -> NodeHandle {
        let epoch = self.epoch;
        let slot = self.slot_mut(id);
        if slot.label == epoch && slot.id.is_valid() {
            raise(InvariantViolation::DoubleGeneration { id, epoch });
        }
        if slot.bound.is_valid() && slot.bound != init.location {
            raise(InvariantViolation::LocationRebound { id, bound: slot.bound, requested: init.location });
        }
        slot.label = epoch;
        slot.id = id;
        slot.bound = init.location;
        slot.node = init.into();
        self.generated += 1;
        NodeHandle { id, epoch }
    }

    /// `true` if `id` holds a node generated in the current epoch.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| self.is_live(s))
    }

    pub fn get_node(&self, id: NodeId) -> &SearchNode {
        match self.slot(id) {
            Some(slot) if self.is_live(slot) => &slot.node,
            _ => raise(InvariantViolation::NodeNotLive { id, epoch: self.epoch }),
        }
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.live_mut(id).node
    }

    /// A checked handle to the live node at `id`, for use as a parent link.
    pub fn handle(&self, id: NodeId) -> NodeHandle {
        if !self.has_node(id) {
            raise(InvariantViolation::NodeNotLive { id, epoch: self.epoch });
        }
        NodeHandle { id, epoch: self.epoch }
    }

    /// Resolve a parent handle.
    pub fn node(&self, handle: NodeHandle) -> &SearchNode {
        if handle.epoch != self.epoch {
            raise(InvariantViolation::StaleHandle {
                id:           handle.id,
                handle_epoch: handle.epoch,
                pool_epoch:   self.epoch,
            });
        }
        self.get_node(handle.id)
    }

    /// `false` for any id without a live node, like [`has_node`](Self::has_node).
    pub fn is_closed(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| self.is_live(s) && s.node.closed)
    }

    pub fn close_node(&mut self, id: NodeId) {
        self.live_mut(id).node.closed = true;
    }

    /// Kill one node without ending the epoch.
    pub fn free_node(&mut self, id: NodeId) {
        self.live_mut(id).id = NodeId::INVALID;
        self.generated -= 1;
    }

    /// End the current search: every node becomes dead.
    ///
    /// Epochs are reused after 2^32 resets, so a [`NodeHandle`] must not be
    /// kept across that many.
    pub fn reset(&mut self) {
        self.generated = 0;
        match self.epoch.checked_add(1) {
            Some(next) => self.epoch = next,
            None => {
                tracing::debug!(blocks = self.allocated_blocks(), "node pool epoch wrapped, relabelling");
                for slot in self.blocks.iter_mut().flatten().flat_map(|b| b.iter_mut()) {
                    slot.label = 0;
                }
                self.epoch = 1;
            }
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Live nodes generated in the current epoch.
    pub fn generated(&self) -> usize {
        self.generated
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn allocated_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    #[cfg(test)]
    pub(crate) fn set_epoch(&mut self, epoch: u32) {
        self.epoch = epoch;
    }
}
