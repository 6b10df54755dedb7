//! Seedable random source shared by weight sampling and file selection.

use crate::hash::stable_hash_str;

/// Small splitmix64 generator so runs replay exactly from a recorded seed.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a generator starting at `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Create the shuffle generator for one category of a seeded run.
    ///
    /// Each category gets its own stream, so the traversal order of one pool does
    /// not shift when another category's pool grows or shrinks.
    pub fn for_category(seed: u64, category: &str) -> Self {
        Self::new(category_seed(seed, category))
    }

    /// Current internal state.
    pub fn state(&self) -> u64 {
        self.state
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64_internal().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Seed of the per-category stream derived from a run seed.
pub fn category_seed(seed: u64, category: &str) -> u64 {
    stable_hash_str(seed, category)
}
