//! Entropy for identifier derivation.
//!
//! Factories take an [`EntropySource`] instead of reaching for a global RNG,
//! so tests can pin derived identifiers without touching shared state.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::OsRng;
use rand::RngCore;

use super::hash::double_sha256_multi;
use crate::config::ENTROPY_LENGTH;

/// Anything that can hand out 32 bytes of entropy.
pub trait EntropySource: Send + Sync {
    fn generate(&self) -> [u8; ENTROPY_LENGTH];
}

/// Operating-system randomness. Use this outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn generate(&self) -> [u8; ENTROPY_LENGTH] {
        let mut bytes = [0u8; ENTROPY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        bytes
    }
}

/// Returns the same bytes on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy([u8; ENTROPY_LENGTH]);

impl FixedEntropy {
    pub const fn new(bytes: [u8; ENTROPY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl EntropySource for FixedEntropy {
    fn generate(&self) -> [u8; ENTROPY_LENGTH] {
        self.0
    }
}

/// Deterministic stream: call `n` yields `double_sha256(seed || u64_le(n))`.
///
/// Distinct values per call, identical across runs for the same seed.
#[derive(Debug)]
pub struct SeededEntropy {
    seed: [u8; ENTROPY_LENGTH],
    counter: AtomicU64,
}

impl SeededEntropy {
    pub const fn new(seed: [u8; ENTROPY_LENGTH]) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn generate(&self) -> [u8; ENTROPY_LENGTH] {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        double_sha256_multi(&[&self.seed, &n.to_le_bytes()])
    }
}
