//! Splittable random streams.
//!
//! A [`StreamSeed`] is a plain value. Tasks receive a seed and build their
//! own generator from it, so no generator instance is ever shared and the
//! draws of one rollout never depend on how siblings were scheduled.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Salt applied before deriving child seeds, keeping them apart from the
/// run streams of the parent seed
const SPLIT_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamSeed(u64);

impl StreamSeed {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Independent seed for child task `index` (a replication, a held-out sample, ...)
    pub fn split(&self, index: u64) -> StreamSeed {
        let mut rng = ChaCha20Rng::seed_from_u64(self.0 ^ SPLIT_SALT);
        rng.set_stream(index);
        StreamSeed(rng.next_u64())
    }

    /// Generator driving seed selection and spread for rollout `run`
    pub fn rollout_rng(&self, run: u64) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(self.0);
        rng.set_stream(2 * run);
        rng
    }

    /// Generator for the false-negative draws of rollout `run`
    pub fn detection_rng(&self, run: u64) -> ChaCha20Rng {
        let mut rng = ChaCha20Rng::seed_from_u64(self.0);
        rng.set_stream(2 * run + 1);
        rng
    }
}

impl Default for StreamSeed {
    fn default() -> Self {
        StreamSeed(42)
    }
}
