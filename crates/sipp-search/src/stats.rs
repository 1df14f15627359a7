//! Search effort counters.

use std::ops::AddAssign;

/// Node counts for one search, or summed over many.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Nodes popped from FOCAL.
    pub expanded:  u64,
    /// Nodes created in the pool (start node included).
    pub generated: u64,
    /// Closed nodes reopened after a better (cheaper or less conflicting) route.
    pub reopened:  u64,
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, other: Self) {
        self.expanded += other.expanded;
        self.generated += other.generated;
        self.reopened += other.reopened;
    }
}
