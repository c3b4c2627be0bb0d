//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG, seed derivation, and tie-breaking logic so the
//! same dataset and seed produce the same forest on every platform and for
//! any number of worker threads.

use rand::RngCore;
use std::cmp::Ordering;

/// 64-bit Linear Congruential Generator (Knuth MMIX constants)
///
/// Raw LCG low bits are weak, so every output goes through a 64-bit
/// finalizer before it is handed out.
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: mix64(seed ^ Self::INCREMENT),
        }
    }

    fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        mix64(self.state)
    }
}

impl RngCore for LcgRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Finalizer from xxhash64 / splitmix64
fn mix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xC2B2AE3D27D4EB4F);
    h ^= h >> 29;
    h = h.wrapping_mul(0x165667B19E3779F9);
    h ^= h >> 32;
    h
}

/// Seed for an indexed stream (one per tree) derived from the base seed
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    const PRIME1: u64 = 0x9E3779B185EBCA87;
    const PRIME5: u64 = 0x85EBCA77C2B2AE63;

    let h = base.wrapping_add(PRIME5);
    let h = (h ^ stream.wrapping_mul(PRIME1)).rotate_left(27);
    mix64(h.wrapping_mul(PRIME1))
}

/// Deterministic tie-breaker for split selection
///
/// Among equal-gain candidates the lower feature index wins, then the lower
/// threshold.
#[derive(Debug, Clone, Copy)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}

impl Ord for SplitTieBreaker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }
}

impl PartialOrd for SplitTieBreaker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SplitTieBreaker {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SplitTieBreaker {}
