//! Typed integer ids.
//!
//! Agents, map locations and pool slots are all plain `u32` indices
//! underneath.  Wrapping each in its own newtype keeps a `LocationId` from
//! being passed where a `NodeId` is expected, at no runtime cost.  The inner
//! integer stays `pub` so tables can build ids directly, but lookups should
//! go through `.index()`.

use std::fmt;

/// Declare an id newtype over an unsigned integer, with an `INVALID`
/// sentinel at the integer's maximum.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Reserved "no id" value.
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// `INVALID`, so a slot that was never written reads as empty.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(-)", stringify!($name))
                }
            }
        }
    };
}

typed_id! {
    /// A planning agent.
    pub struct AgentId(u32);
}

typed_id! {
    /// A map location (grid cell or graph vertex).
    pub struct LocationId(u32);
}

typed_id! {
    /// A slot in a node memory pool.
    pub struct NodeId(u32);
}

/// Owner tag of a free safe interval.
pub const NO_AGENT: AgentId = AgentId::INVALID;
