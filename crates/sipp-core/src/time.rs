//! Discrete planning time.
//!
//! # Design
//!
//! Agents move in lock-step: one move or wait per `Timestep`.  Reservations
//! are half-open ranges `[low, high)` of timesteps, and "forever" is spelled
//! [`MAX_TIMESTEP`].
//!
//! `MAX_TIMESTEP` is half of `u32::MAX` so that `MAX_TIMESTEP + 1` (the
//! latest possible arrival after leaving an unbounded interval) and the sum of
//! two in-range timesteps never overflow.

use std::fmt;

// ── Timestep ──────────────────────────────────────────────────────────────────

/// An absolute planning timestep.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestep(pub u32);

/// The unbounded future.  Every partition ends here.
pub const MAX_TIMESTEP: Timestep = Timestep(u32::MAX / 2);

impl Timestep {
    pub const ZERO: Timestep = Timestep(0);

    /// The following timestep.
    #[inline]
    pub fn next(self) -> Timestep {
        Timestep(self.0 + 1)
    }

    /// `true` for [`MAX_TIMESTEP`].
    #[inline]
    pub fn is_unbounded(self) -> bool {
        self >= MAX_TIMESTEP
    }

    /// Cast to `usize` for indexing a [`Path`](crate::Path).
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::Add<u32> for Timestep {
    type Output = Timestep;
    #[inline]
    fn add(self, rhs: u32) -> Timestep {
        Timestep(self.0 + rhs)
    }
}

impl std::ops::Sub for Timestep {
    type Output = u32;
    /// # Panics
    /// Panics in debug mode if `rhs > self`.
    #[inline]
    fn sub(self, rhs: Timestep) -> u32 {
        self.0 - rhs.0
    }
}

impl From<usize> for Timestep {
    /// Path indices are timesteps; paths never approach `u32::MAX` entries.
    #[inline]
    fn from(t: usize) -> Timestep {
        Timestep(t as u32)
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "MAX")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
