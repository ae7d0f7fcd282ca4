//! # meshsim-engine::rng
//!
//! The simulation's single deterministic randomness source. Every stochastic decision — latency sampling, loss rolls, burst
//! triggers, random-topology edge sampling, alias-hash tie-breaking — draws
//! from this one `ChaCha20Rng` stream so that a fixed seed reproduces a
//! fixed simulation.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub struct Rng {
    seed: u64,
    inner: ChaCha20Rng,
}

impl Rng {
    /// A seed of 0 means "pick a fresh seed". The fresh seed is drawn from
    /// OS entropy and returned so the caller can log it — a run seeded this
    /// way is not reproducible unless the resulting seed is recorded.
    pub fn from_scenario_seed(seed: u64) -> Self {
        let resolved = if seed == 0 {
            rand::thread_rng().next_u64().max(1)
        } else {
            seed
        };
        Self {
            seed: resolved,
            inner: ChaCha20Rng::seed_from_u64(resolved),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn inner_mut(&mut self) -> &mut ChaCha20Rng {
        &mut self.inner
    }
}
