//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed of the session.
//!
//! Each subsystem gets its own stream per tick, seeded from
//! (master_seed, subsystem slot, tick). This means:
//!   - Adding a new subsystem never changes existing subsystems' streams.
//!   - A tick's draws do not depend on how many draws earlier ticks made.

use crate::types::{CustomerId, Tick};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// One subsystem's stream for one tick.
pub struct SubsystemRng {
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    pub fn new(master_seed: u64, subsystem_index: u64, tick: Tick) -> Self {
        let derived_seed = master_seed
            ^ subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ tick.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        Self { inner: Pcg64Mcg::seed_from_u64(derived_seed) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        let idx = self.next_u64_below(items.len() as u64) as usize;
        items[idx]
    }

    /// A random (version 4 layout) UUID built from this stream.
    pub fn next_uuid(&mut self) -> CustomerId {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.inner.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.inner.next_u64().to_le_bytes());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// All subsystem RNGs for a single session.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_subsystem(&self, slot: SubsystemSlot, tick: Tick) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64, tick)
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Mold = 0,
    Customer = 1,
}
