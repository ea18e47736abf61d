//! Bloom filter for cheap probabilistic dedup of seen URLs
//!
//! The frontier keeps an exact `HashSet` for authoritative dedup, but that
//! set grows without bound over a long crawl. This filter sits in front of
//! it as a fast, memory-bounded pre-check: a negative answer here is always
//! correct (skip the exact-set lookup), a positive answer may be a false
//! positive and still needs the exact set to confirm.

use sha2::{Digest, Sha256};

/// A fixed-size bitset bloom filter using double hashing over one SHA-256
/// digest (Kirsch-Mitzenmacher: `h_i(x) = h1(x) + i * h2(x)`).
pub struct BloomFilter {
    bits: Vec<bool>,
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a filter sized for `expected_items` with a target false
    /// positive rate of `fp_rate` (e.g. 0.01 for 1%).
    ///
    /// Uses the standard formulas:
    /// - `m = -(n * ln(p)) / (ln(2)^2)` (bit array size)
    /// - `k = (m / n) * ln(2)` (number of hash functions)
    pub fn new(expected_items: usize, fp_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = fp_rate.clamp(0.0001, 0.5);

        let m = (-(n * p.ln()) / (std::f64::consts::LN_2.powi(2))).ceil() as usize;
        let m = m.max(8);
        let k = ((m as f64 / n) * std::f64::consts::LN_2).round().max(1.0) as u32;

        Self {
            bits: vec![false; m],
            num_hashes: k.min(16),
        }
    }

    /// Inserts an item, returning `true` if it may already have been present
    /// (all of its bit positions were already set).
    pub fn insert(&mut self, item: &str) -> bool {
        let (h1, h2) = Self::hash_pair(item);
        let len = self.bits.len() as u64;

        let mut already_present = true;
        for i in 0..self.num_hashes as u64 {
            let idx = (h1.wrapping_add(i.wrapping_mul(h2)) % len) as usize;
            if !self.bits[idx] {
                already_present = false;
            }
            self.bits[idx] = true;
        }
        already_present
    }

    /// Checks whether an item may have been inserted (false positives possible).
    pub fn contains(&self, item: &str) -> bool {
        let (h1, h2) = Self::hash_pair(item);
        let len = self.bits.len() as u64;

        (0..self.num_hashes as u64).all(|i| {
            let idx = (h1.wrapping_add(i.wrapping_mul(h2)) % len) as usize;
            self.bits[idx]
        })
    }

    /// Number of bits in the underlying bit array
    pub fn capacity_bits(&self) -> usize {
        self.bits.len()
    }

    fn hash_pair(item: &str) -> (u64, u64) {
        let digest = Sha256::digest(item.as_bytes());
        let h1 = u64::from_le_bytes(digest[0..8].try_into().unwrap());
        let h2 = u64::from_le_bytes(digest[8..16].try_into().unwrap());
        // Double hashing requires h2 to be odd relative to the table size;
        // OR-ing in 1 keeps it non-zero so every hash slot is reachable.
        (h1, h2 | 1)
    }
}
