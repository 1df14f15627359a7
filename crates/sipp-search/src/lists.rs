//! OPEN and FOCAL as ordered sets of keys.
//!
//! Both lists hold small `Copy` keys rather than nodes.  Every key can be
//! rebuilt from the node it names (`f`, `h`, `conflicts`, `tie`, id), so a
//! node is removed or re-keyed with two `BTreeSet::remove` calls and no
//! stored heap handles.
//!
//! ```text
//! OPEN  : (f, h, tie, id)              min f, then min h, then random
//! FOCAL : (conflicts, f, h, tie, id)   open nodes with f <= bound
//! ```
//!
//! `bound = floor(w * f_min)`.  It only ever grows: when the head of OPEN
//! moves to a larger `f`, every open node in `(old_bound, new_bound]` is
//! copied into FOCAL with one range scan.

use std::collections::BTreeSet;

use sipp_core::NodeId;
use sipp_table::{NodeMemoryPool, SearchNode};

use crate::SearchConfig;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
struct OpenKey {
    f:   u32,
    h:   u32,
    tie: u64,
    id:  NodeId,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
struct FocalKey {
    conflicts: u32,
    f:         u32,
    h:         u32,
    tie:       u64,
    id:        NodeId,
}

impl OpenKey {
    fn of(id: NodeId, node: &SearchNode) -> Self {
        Self { f: node.f(), h: node.h, tie: node.tie, id }
    }

    fn focal(self, conflicts: u32) -> FocalKey {
        FocalKey { conflicts, f: self.f, h: self.h, tie: self.tie, id: self.id }
    }
}

pub(crate) struct FocalLists {
    open:  BTreeSet<OpenKey>,
    focal: BTreeSet<FocalKey>,
    min_f: u32,
    bound: u32,
}

impl FocalLists {
    pub(crate) fn new() -> Self {
        Self { open: BTreeSet::new(), focal: BTreeSet::new(), min_f: 0, bound: 0 }
    }

    pub(crate) fn clear(&mut self) {
        self.open.clear();
        self.focal.clear();
        self.min_f = 0;
        self.bound = 0;
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub(crate) fn open_len(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn focal_len(&self) -> usize {
        self.focal.len()
    }

    pub(crate) fn push(&mut self, id: NodeId, node: &SearchNode, config: &SearchConfig) {
        let key = OpenKey::of(id, node);
        if self.open.is_empty() {
            self.min_f = key.f;
            self.bound = config.focal_bound(key.f);
        }
        self.open.insert(key);
        if key.f <= self.bound {
            self.focal.insert(key.focal(node.conflicts));
        }
    }

    /// Drop `node`'s keys; call before changing any keyed field.
    pub(crate) fn remove(&mut self, id: NodeId, node: &SearchNode) {
        let key = OpenKey::of(id, node);
        self.open.remove(&key);
        self.focal.remove(&key.focal(node.conflicts));
    }

    /// Take the best FOCAL node out of both lists.
    pub(crate) fn pop(&mut self, pool: &NodeMemoryPool, config: &SearchConfig) -> Option<NodeId> {
        self.widen_focal(pool, config);
        let best = self.focal.pop_first()?;
        self.open.remove(&OpenKey { f: best.f, h: best.h, tie: best.tie, id: best.id });
        Some(best.id)
    }

    /// Re-derive the bound after OPEN's minimum has grown.
    fn widen_focal(&mut self, pool: &NodeMemoryPool, config: &SearchConfig) {
        let Some(head) = self.open.first().copied() else {
            return;
        };
        if head.f <= self.min_f {
            return;
        }
        let new_bound = config.focal_bound(head.f);
        if new_bound > self.bound {
            let from = OpenKey { f: self.bound + 1, h: 0, tie: 0, id: NodeId(0) };
            for key in self.open.range(from..).take_while(|k| k.f <= new_bound) {
                let conflicts = pool.get_node(key.id).conflicts;
                self.focal.insert(key.focal(conflicts));
            }
            tracing::trace!(old = self.bound, new = new_bound, focal = self.focal.len(), "focal bound widened");
            self.bound = new_bound;
        }
        self.min_f = head.f;
    }
}
