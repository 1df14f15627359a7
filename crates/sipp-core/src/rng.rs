//! Deterministic tie-break RNG for searches.
//!
//! # Determinism strategy
//!
//! Open and focal lists break exact ties randomly so that equally good nodes
//! are not always expanded in insertion order.  The random source is an
//! explicit `TieBreakRng` owned by the search, never a process-wide generator,
//! and is seeded per agent:
//!
//!   seed = base_seed XOR (agent_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive agent IDs uniformly across the seed space.  Two
//! runs with the same base seed expand nodes in exactly the same order.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::AgentId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seedable random source for tie-breaking.
///
/// `!Sync` by construction (the inner `SmallRng` is not shared); give every
/// concurrent search its own instance.
pub struct TieBreakRng(SmallRng);

impl TieBreakRng {
    pub fn new(seed: u64) -> Self {
        TieBreakRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed deterministically from a base seed and the planning agent.
    pub fn for_agent(base_seed: u64, agent: AgentId) -> Self {
        let seed = base_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        TieBreakRng(SmallRng::seed_from_u64(seed))
    }

    /// Draw a fresh tie-break key.
    #[inline]
    pub fn next_key(&mut self) -> u64 {
        self.0.r#gen()
    }
}
