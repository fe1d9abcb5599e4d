//! Tabulation ("XOR fast") hash (spec §4.10).
//!
//! Grounded on `examples/original_source/DataStructures/XORFastHash.h`: two
//! 2^16-entry tables, each a shuffled identity permutation of `0..=u16::MAX`;
//! a 32-bit key is split into its low and high 16 bits, each half indexes
//! its own table, and the two looked-up bytes are XORed together. This is
//! used to break ties during independent-set tie-breaking (§4.5.2) and to
//! key the generation-stamped [`crate::heap::HashedStorage`] heap variant.
//! It is a fast, deterministic (for a fixed seed) pseudo-hash, not a
//! cryptographic one.

use rand::{seq::SliceRandom, SeedableRng};
use rand::rngs::StdRng;

const TABLE_SIZE: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct XorFastHash {
    table1: Vec<u16>,
    table2: Vec<u16>,
}

impl XorFastHash {
    /// A shuffled hash with a fixed default seed, so that independent-set
    /// tie-breaking (spec §4.5.2) is reproducible across runs and satisfies
    /// spec §8 property 4 (determinism independent of worker count).
    pub fn new() -> Self {
        Self::with_seed(0x5eed_1234_dead_beef)
    }

    /// Deterministic construction, for tests and for reproducible
    /// independent-set tie-breaking across runs with the same seed.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut table1: Vec<u16> = (0..TABLE_SIZE as u32).map(|v| v as u16).collect();
        let mut table2 = table1.clone();
        table1.shuffle(&mut rng);
        table2.shuffle(&mut rng);
        Self { table1, table2 }
    }

    /// Hash a 32-bit key down to 16 bits.
    pub fn hash(&self, key: u32) -> u16 {
        let low = (key & 0xFFFF) as usize;
        let high = (key >> 16) as usize;
        self.table1[low] ^ self.table2[high]
    }
}

impl Default for XorFastHash {
    fn default() -> Self {
        Self::new()
    }
}
